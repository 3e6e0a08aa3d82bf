// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, ScrapeAllPayload, ScrapeTargetPayload};
use crate::domain::models::target::ScraperTarget;
use crate::domain::repositories::target_repository::TargetRepository;
use crate::queue::job_queue::QueueError;
use crate::queue::scheduler::JobScheduler;
use crate::utils::errors::RepositoryError;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ScrapeUseCaseError {
    #[error("Target not found")]
    NotFound,
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

/// 运维侧的抓取入口：目标列表、全量/单目标抓取入队、死信查询
pub struct ScrapeUseCase {
    targets: Arc<dyn TargetRepository>,
    scheduler: JobScheduler,
}

impl ScrapeUseCase {
    pub fn new(targets: Arc<dyn TargetRepository>, scheduler: JobScheduler) -> Self {
        Self { targets, scheduler }
    }

    pub async fn list_targets(&self) -> Result<Vec<ScraperTarget>, ScrapeUseCaseError> {
        Ok(self.targets.list_all().await?)
    }

    pub async fn enqueue_all(&self, force: bool) -> Result<Job, ScrapeUseCaseError> {
        Ok(self.scheduler.enqueue(&ScrapeAllPayload { force }).await?)
    }

    pub async fn enqueue_target(&self, target_id: Uuid) -> Result<Job, ScrapeUseCaseError> {
        if self.targets.find_by_id(target_id).await?.is_none() {
            return Err(ScrapeUseCaseError::NotFound);
        }
        Ok(self
            .scheduler
            .enqueue(&ScrapeTargetPayload { target_id })
            .await?)
    }

    pub async fn dead_jobs(&self, limit: u64) -> Result<Vec<Job>, ScrapeUseCaseError> {
        Ok(self.scheduler.queue().list_dead(limit).await?)
    }
}
