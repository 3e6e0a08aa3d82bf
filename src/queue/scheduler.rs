// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScheduleSettings;
use crate::domain::models::job::{
    CleanupOldDataPayload, Job, JobPayload, ScrapeAllPayload,
};
use crate::queue::job_queue::{JobQueue, QueueError};
use crate::utils::retry_policy::RetryPolicy;
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{debug, error, info, warn};

/// 失败作业的去向
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// 已重新排队，在给定时间后再次执行
    Requeued(DateTime<Utc>),
    /// 已移入死信
    Buried,
}

/// 作业调度器
///
/// 负责类型化入队、延迟调度、失败重试与死信，以及队列维护
#[derive(Clone)]
pub struct JobScheduler {
    /// 作业队列
    queue: Arc<dyn JobQueue>,
    /// 重试策略
    retry_policy: RetryPolicy,
}

impl JobScheduler {
    /// 创建新的作业调度器实例
    ///
    /// # 参数
    ///
    /// * `queue` - 作业队列
    /// * `retry_policy` - 重试策略，其 `max_attempts` 会写入每个新作业
    pub fn new(queue: Arc<dyn JobQueue>, retry_policy: RetryPolicy) -> Self {
        Self {
            queue,
            retry_policy,
        }
    }

    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// 立即入队类型化负载，通道由作业类型决定
    pub async fn enqueue<P: JobPayload + Sync>(&self, payload: &P) -> Result<Job, QueueError> {
        self.enqueue_at(payload, Utc::now()).await
    }

    /// 在特定时间调度作业执行
    pub async fn enqueue_at<P: JobPayload + Sync>(
        &self,
        payload: &P,
        time: DateTime<Utc>,
    ) -> Result<Job, QueueError> {
        let job = Job::from_payload(payload)?
            .with_max_attempts(self.retry_policy.max_attempts as i32)
            .run_at(time);
        self.queue.enqueue(job).await
    }

    /// 在一段时间后调度作业执行
    ///
    /// # 参数
    ///
    /// * `payload` - 作业负载
    /// * `delay` - 延迟时间
    pub async fn enqueue_in<P: JobPayload + Sync>(
        &self,
        payload: &P,
        delay: Duration,
    ) -> Result<Job, QueueError> {
        let run_at = Utc::now()
            .checked_add_signed(delay)
            .ok_or_else(|| QueueError::Schedule(format!("delay {} is out of range", delay)))?;
        self.enqueue_at(payload, run_at).await
    }

    /// 处理一次失败的执行
    ///
    /// 仍有剩余尝试次数时按退避时间重新排队，否则移入死信
    pub async fn retry(&self, job: Job, error: String) -> Result<RetryOutcome, QueueError> {
        let attempt = job.attempt_count.max(0) as u32;
        if !job.can_retry() {
            return self.dead_letter(job, error).await.map(|_| RetryOutcome::Buried);
        }

        let run_at = self.retry_policy.next_retry_time(attempt, Utc::now());
        warn!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempt,
            max_attempts = job.max_attempts,
            "Job failed, retrying at {}: {}",
            run_at,
            error
        );
        self.queue.requeue(job, run_at, error).await?;
        Ok(RetryOutcome::Requeued(run_at))
    }

    /// 直接移入死信
    pub async fn dead_letter(&self, job: Job, error: String) -> Result<Job, QueueError> {
        error!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempts = job.attempt_count,
            "Job moved to dead letter: {}",
            error
        );
        counter!("jobs_dead_total", "job_type" => job.job_type.as_str()).increment(1);
        self.queue.bury(job, error).await
    }

    /// 安排周期作业的下一次执行
    ///
    /// 队列里已有同类型的排队作业时不再入队，返回 `None`
    pub async fn schedule_next<P: JobPayload + Sync>(
        &self,
        payload: &P,
        delay: Duration,
    ) -> Result<Option<Job>, QueueError> {
        if self.queue.has_queued(P::JOB_TYPE).await? {
            debug!(job_type = %P::JOB_TYPE, "Next occurrence already queued");
            return Ok(None);
        }
        self.enqueue_in(payload, delay).await.map(Some)
    }

    /// 安排周期作业的第一次执行
    ///
    /// 全量抓取与数据清理在各自处理完成后会再次安排下一次，重启不会产生重复的周期链
    pub async fn schedule_periodic_jobs(&self, settings: &ScheduleSettings) -> Result<(), QueueError> {
        let scrape_every = settings.scrape_all_interval().ok_or_else(|| {
            QueueError::Schedule(format!(
                "scrape_all_every_hours {}",
                settings.scrape_all_every_hours
            ))
        })?;
        let cleanup_every = settings.cleanup_interval().ok_or_else(|| {
            QueueError::Schedule(format!("cleanup_every_hours {}", settings.cleanup_every_hours))
        })?;

        self.schedule_next(&ScrapeAllPayload { force: false }, scrape_every)
            .await?;
        self.schedule_next(
            &CleanupOldDataPayload {
                days_old: settings.cleanup_days_old,
            },
            cleanup_every,
        )
        .await?;

        info!(
            scrape_all_every_hours = settings.scrape_all_every_hours,
            cleanup_every_hours = settings.cleanup_every_hours,
            "Periodic jobs scheduled"
        );
        Ok(())
    }

    /// 启动调度器后台维护任务
    ///
    /// 每分钟处理超过 `stuck_timeout` 仍处于 active 的作业（放回队列或转入死信）
    pub fn start(&self, stuck_timeout: Duration) -> JoinHandle<()> {
        let queue = self.queue.clone();

        tokio::spawn(async move {
            let mut interval = interval(TokioDuration::from_secs(60));

            loop {
                interval.tick().await;

                match queue.reset_stuck(stuck_timeout).await {
                    Ok(reset) if reset.requeued > 0 || reset.dead > 0 => info!(
                        requeued = reset.requeued,
                        dead = reset.dead,
                        "Reset stuck jobs"
                    ),
                    Ok(_) => {}
                    Err(e) => error!("Failed to reset stuck jobs: {}", e),
                }
            }
        })
    }
}
