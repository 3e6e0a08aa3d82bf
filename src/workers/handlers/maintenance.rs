// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScheduleSettings;
use crate::domain::models::job::{
    CleanupOldDataPayload, DedupeDataPayload, EnrichDataPayload, Job, JobType,
};
use crate::domain::repositories::scrape_run_repository::ScrapeRunRepository;
use crate::domain::repositories::scraped_row_repository::ScrapedRowRepository;
use crate::domain::services::deduplication::{enrich_row, select_duplicates};
use crate::queue::scheduler::JobScheduler;
use crate::utils::errors::JobError;
use crate::workers::worker::JobHandler;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// `scrape:enrich` 处理器
pub struct EnrichDataHandler {
    rows: Arc<dyn ScrapedRowRepository>,
}

impl EnrichDataHandler {
    pub fn new(rows: Arc<dyn ScrapedRowRepository>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl JobHandler for EnrichDataHandler {
    fn job_type(&self) -> JobType {
        JobType::ScrapeEnrich
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let payload: EnrichDataPayload = job.decode()?;

        let mut enriched = 0usize;
        for mut row in self.rows.list_by_target(payload.target_id).await? {
            if enrich_row(&mut row) {
                self.rows.update_normalized(row.id, &row.normalized).await?;
                enriched += 1;
            }
        }

        info!(target_id = %payload.target_id, "Enriched {} rows", enriched);
        Ok(())
    }
}

/// `scrape:dedupe` 处理器
///
/// 唯一索引已经阻止了重复插入，这里只清理并发竞争中漏过的记录
pub struct DedupeDataHandler {
    rows: Arc<dyn ScrapedRowRepository>,
}

impl DedupeDataHandler {
    pub fn new(rows: Arc<dyn ScrapedRowRepository>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl JobHandler for DedupeDataHandler {
    fn job_type(&self) -> JobType {
        JobType::ScrapeDedupe
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let payload: DedupeDataPayload = job.decode()?;

        let mut removed = 0u64;
        for dup in self.rows.find_duplicate_hashes(payload.target_id).await? {
            debug!(hash_key = %dup.hash_key, count = dup.count, "Duplicate hash found");
            let rows = self
                .rows
                .list_by_hash(payload.target_id, &dup.hash_key)
                .await?;
            let ids = select_duplicates(&rows);
            if !ids.is_empty() {
                removed += self.rows.delete_by_ids(&ids).await?;
            }
        }

        info!(target_id = %payload.target_id, "Removed {} duplicate rows", removed);
        Ok(())
    }
}

/// `cleanup:old_data` 处理器
///
/// 删除超过保留期的抓取数据、运行记录和已完成作业，然后安排下一次清理
pub struct CleanupOldDataHandler {
    rows: Arc<dyn ScrapedRowRepository>,
    runs: Arc<dyn ScrapeRunRepository>,
    scheduler: JobScheduler,
    schedule: ScheduleSettings,
}

impl CleanupOldDataHandler {
    pub fn new(
        rows: Arc<dyn ScrapedRowRepository>,
        runs: Arc<dyn ScrapeRunRepository>,
        scheduler: JobScheduler,
        schedule: &ScheduleSettings,
    ) -> Self {
        Self {
            rows,
            runs,
            scheduler,
            schedule: schedule.clone(),
        }
    }
}

#[async_trait]
impl JobHandler for CleanupOldDataHandler {
    fn job_type(&self) -> JobType {
        JobType::CleanupOldData
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let payload: CleanupOldDataPayload = job.decode()?;
        if payload.days_old < 0 {
            return Err(JobError::Permanent(format!(
                "days_old must not be negative, got {}",
                payload.days_old
            )));
        }
        let cutoff = Duration::try_days(payload.days_old)
            .and_then(|retention| Utc::now().checked_sub_signed(retention))
            .ok_or_else(|| {
                JobError::Permanent(format!("days_old out of range: {}", payload.days_old))
            })?;
        let every = self.schedule.cleanup_interval().ok_or_else(|| {
            JobError::Permanent(format!(
                "invalid cleanup_every_hours: {}",
                self.schedule.cleanup_every_hours
            ))
        })?;

        let rows = self.rows.delete_older_than(cutoff).await?;
        let runs = self.runs.delete_older_than(cutoff).await?;
        let jobs = self.scheduler.queue().purge_completed(cutoff).await?;
        info!(
            days_old = payload.days_old,
            "Cleanup completed: removed {} scraped rows, {} scraper runs and {} jobs",
            rows,
            runs,
            jobs
        );

        self.scheduler.schedule_next(&payload, every).await?;
        Ok(())
    }
}
