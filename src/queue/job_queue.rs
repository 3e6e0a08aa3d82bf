// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::LaneWeights;
use crate::domain::models::job::{Job, JobStatus, JobType, Lane};
use crate::domain::repositories::job_repository::{JobRepository, StuckReset};
use crate::domain::repositories::RepositoryError;
use crate::utils::errors::JobError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// 负载序列化失败
    #[error("Payload encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// 执行时间或周期间隔无效
    #[error("Invalid schedule: {0}")]
    Schedule(String),
}

impl From<QueueError> for JobError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Repository(e) => e.into(),
            QueueError::Encode(e) => JobError::Permanent(format!("failed to encode payload: {}", e)),
            QueueError::Schedule(msg) => JobError::Permanent(format!("invalid schedule: {}", msg)),
        }
    }
}

/// 作业队列特质
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// 入队作业
    async fn enqueue(&self, job: Job) -> Result<Job, QueueError>;

    /// 按通道权重出队作业
    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<Job>, QueueError>;

    /// 完成作业
    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError>;

    /// 重新排队，在 `run_at` 之后才可再次出队
    async fn requeue(&self, job: Job, run_at: DateTime<Utc>, error: String) -> Result<Job, QueueError>;

    /// 移入死信
    async fn bury(&self, job: Job, error: String) -> Result<Job, QueueError>;

    /// 列出死信作业
    async fn list_dead(&self, limit: u64) -> Result<Vec<Job>, QueueError>;

    /// 是否已有该类型仍在排队的作业
    async fn has_queued(&self, job_type: JobType) -> Result<bool, QueueError>;

    /// 删除截止时间之前完成的作业
    async fn purge_completed(&self, before: DateTime<Utc>) -> Result<u64, QueueError>;

    /// 处理长时间处于 active 的作业：尝试次数用尽的转入死信，其余放回队列
    async fn reset_stuck(&self, timeout: Duration) -> Result<StuckReset, QueueError>;
}

/// 按权重无放回抽样得到通道尝试顺序
///
/// 第一个通道被选中的概率与其权重成正比；权重为 0 的通道排在最后
pub fn weighted_lane_order<G: Rng + ?Sized>(weights: &LaneWeights, rng: &mut G) -> Vec<Lane> {
    let mut pool = vec![
        (Lane::Critical, weights.critical),
        (Lane::Default, weights.default),
        (Lane::Low, weights.low),
    ];
    let mut order = Vec::with_capacity(pool.len());

    while !pool.is_empty() {
        let total: u32 = pool.iter().map(|(_, w)| *w).sum();
        if total == 0 {
            order.extend(pool.drain(..).map(|(lane, _)| lane));
            break;
        }

        let mut pick = rng.random_range(0..total);
        let idx = pool
            .iter()
            .position(|(_, w)| {
                if pick < *w {
                    true
                } else {
                    pick -= *w;
                    false
                }
            })
            .unwrap_or(0);
        order.push(pool.remove(idx).0);
    }

    order
}

/// 数据库作业队列实现
pub struct DatabaseJobQueue<R: JobRepository> {
    /// 作业仓库
    repository: Arc<R>,
    /// 通道权重
    weights: LaneWeights,
}

impl<R: JobRepository> DatabaseJobQueue<R> {
    /// 创建新的数据库作业队列实例
    ///
    /// # 参数
    ///
    /// * `repository` - 作业仓库
    /// * `weights` - critical/default/low 通道权重
    pub fn new(repository: Arc<R>, weights: LaneWeights) -> Self {
        Self {
            repository,
            weights,
        }
    }
}

#[async_trait]
impl<R: JobRepository> JobQueue for DatabaseJobQueue<R> {
    async fn enqueue(&self, job: Job) -> Result<Job, QueueError> {
        let created = self.repository.create(&job).await?;
        counter!(
            "jobs_enqueued_total",
            "job_type" => created.job_type.as_str(),
            "queue" => created.queue.as_str()
        )
        .increment(1);
        debug!(job_id = %created.id, job_type = %created.job_type, queue = %created.queue, "Job enqueued");
        Ok(created)
    }

    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<Job>, QueueError> {
        let order = {
            let mut rng = rand::rng();
            weighted_lane_order(&self.weights, &mut rng)
        };

        for lane in order {
            if let Some(job) = self.repository.acquire_next(worker_id, lane).await? {
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        self.repository.mark_completed(job_id).await?;
        Ok(())
    }

    async fn requeue(&self, mut job: Job, run_at: DateTime<Utc>, error: String) -> Result<Job, QueueError> {
        job.status = JobStatus::Queued;
        job.run_at = run_at.fixed_offset();
        job.last_error = Some(error);
        job.lock_token = None;
        job.started_at = None;
        job.completed_at = None;
        Ok(self.repository.update(&job).await?)
    }

    async fn bury(&self, mut job: Job, error: String) -> Result<Job, QueueError> {
        job.status = JobStatus::Dead;
        job.last_error = Some(error);
        job.lock_token = None;
        job.completed_at = Some(Utc::now().fixed_offset());
        Ok(self.repository.update(&job).await?)
    }

    async fn list_dead(&self, limit: u64) -> Result<Vec<Job>, QueueError> {
        Ok(self.repository.list_by_status(JobStatus::Dead, limit).await?)
    }

    async fn has_queued(&self, job_type: JobType) -> Result<bool, QueueError> {
        Ok(self.repository.count_queued(job_type).await? > 0)
    }

    async fn purge_completed(&self, before: DateTime<Utc>) -> Result<u64, QueueError> {
        Ok(self.repository.delete_completed_before(before).await?)
    }

    async fn reset_stuck(&self, timeout: Duration) -> Result<StuckReset, QueueError> {
        let reset = self.repository.reset_stuck_jobs(timeout).await?;
        if reset.dead > 0 {
            counter!("jobs_dead_total", "job_type" => "stuck").increment(reset.dead);
        }
        Ok(reset)
    }
}

#[async_trait]
impl<T: JobQueue + ?Sized> JobQueue for Arc<T> {
    async fn enqueue(&self, job: Job) -> Result<Job, QueueError> {
        (**self).enqueue(job).await
    }

    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<Job>, QueueError> {
        (**self).dequeue(worker_id).await
    }

    async fn complete(&self, job_id: Uuid) -> Result<(), QueueError> {
        (**self).complete(job_id).await
    }

    async fn requeue(&self, job: Job, run_at: DateTime<Utc>, error: String) -> Result<Job, QueueError> {
        (**self).requeue(job, run_at, error).await
    }

    async fn bury(&self, job: Job, error: String) -> Result<Job, QueueError> {
        (**self).bury(job, error).await
    }

    async fn list_dead(&self, limit: u64) -> Result<Vec<Job>, QueueError> {
        (**self).list_dead(limit).await
    }

    async fn has_queued(&self, job_type: JobType) -> Result<bool, QueueError> {
        (**self).has_queued(job_type).await
    }

    async fn purge_completed(&self, before: DateTime<Utc>) -> Result<u64, QueueError> {
        (**self).purge_completed(before).await
    }

    async fn reset_stuck(&self, timeout: Duration) -> Result<StuckReset, QueueError> {
        (**self).reset_stuck(timeout).await
    }
}
