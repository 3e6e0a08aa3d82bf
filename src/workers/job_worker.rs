// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::Job;
use crate::queue::job_queue::QueueError;
use crate::queue::scheduler::{JobScheduler, RetryOutcome};
use crate::utils::errors::JobError;
use crate::workers::worker::HandlerRegistry;
use metrics::counter;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// 作业工作者
///
/// 每次只处理一个作业，处理完才去取下一个
pub struct JobWorker {
    worker_id: Uuid,
    scheduler: JobScheduler,
    registry: Arc<HandlerRegistry>,
    poll_interval: Duration,
}

impl JobWorker {
    pub fn new(
        scheduler: JobScheduler,
        registry: Arc<HandlerRegistry>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            worker_id: Uuid::new_v4(),
            scheduler,
            registry,
            poll_interval,
        }
    }

    pub fn id(&self) -> Uuid {
        self.worker_id
    }

    /// 运行工作循环，直到收到关闭信号
    ///
    /// 关闭信号只在两个作业之间生效，正在执行的作业会先完成
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Job worker {} started", self.worker_id);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let idle = match self.process_next().await {
                Ok(processed) => !processed,
                Err(e) => {
                    error!("Error processing job: {}", e);
                    true
                }
            };

            if idle {
                tokio::select! {
                    _ = sleep(self.poll_interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        info!("Job worker {} stopped", self.worker_id);
    }

    /// 取出并执行一个作业，队列为空时返回 `false`
    pub async fn process_next(&self) -> Result<bool, QueueError> {
        match self.scheduler.queue().dequeue(self.worker_id).await? {
            Some(job) => {
                self.execute(job).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(
        skip(self, job),
        fields(job_id = %job.id, job_type = %job.job_type, attempt = job.attempt_count)
    )]
    async fn execute(&self, job: Job) -> Result<(), QueueError> {
        let Some(handler) = self.registry.get(job.job_type) else {
            let reason = format!("no handler registered for {}", job.job_type);
            self.scheduler.dead_letter(job, reason).await?;
            return Ok(());
        };

        let start = Instant::now();
        let result = handler.handle(&job).await;
        let job_type = job.job_type.as_str();

        match result {
            Ok(()) => {
                self.scheduler.queue().complete(job.id).await?;
                counter!("jobs_completed_total", "job_type" => job_type).increment(1);
                info!(elapsed_ms = start.elapsed().as_millis() as u64, "Job completed");
            }
            Err(JobError::Permanent(reason)) => {
                counter!("jobs_failed_total", "job_type" => job_type).increment(1);
                self.scheduler.dead_letter(job, reason).await?;
            }
            Err(JobError::Retryable(reason)) => {
                counter!("jobs_failed_total", "job_type" => job_type).increment(1);
                if let RetryOutcome::Requeued(run_at) = self.scheduler.retry(job, reason).await? {
                    info!(%run_at, "Job requeued");
                }
            }
        }
        Ok(())
    }
}
