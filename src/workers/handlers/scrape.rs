// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{ScheduleSettings, ScraperSettings};
use crate::domain::models::job::{
    DedupeDataPayload, EnrichDataPayload, Job, JobType, ScrapeAllPayload, ScrapeTargetPayload,
};
use crate::domain::models::scrape_run::{ScrapeStats, ScraperRun};
use crate::domain::models::target::ScraperTarget;
use crate::domain::repositories::scrape_run_repository::ScrapeRunRepository;
use crate::domain::repositories::scraped_row_repository::ScrapedRowRepository;
use crate::domain::repositories::target_repository::TargetRepository;
use crate::engines::headless_engine::HeadlessEngine;
use crate::engines::static_collector::StaticCollector;
use crate::engines::traits::{ScrapeFailure, TargetScraper};
use crate::queue::scheduler::JobScheduler;
use crate::utils::errors::JobError;
use crate::workers::worker::JobHandler;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 目标是否走无头浏览器
pub fn wants_headless(target: &ScraperTarget, settings: &ScraperSettings) -> bool {
    target.use_headless && settings.headless_enabled
}

/// `scrape:target` 处理器
///
/// 记录一次运行，按目标配置选择引擎；只有抓取成功才会入队丰富与去重
pub struct ScrapeTargetHandler {
    targets: Arc<dyn TargetRepository>,
    runs: Arc<dyn ScrapeRunRepository>,
    rows: Arc<dyn ScrapedRowRepository>,
    collector: Arc<StaticCollector>,
    scheduler: JobScheduler,
    settings: ScraperSettings,
}

impl ScrapeTargetHandler {
    pub fn new(
        targets: Arc<dyn TargetRepository>,
        runs: Arc<dyn ScrapeRunRepository>,
        rows: Arc<dyn ScrapedRowRepository>,
        collector: Arc<StaticCollector>,
        scheduler: JobScheduler,
        settings: ScraperSettings,
    ) -> Self {
        Self {
            targets,
            runs,
            rows,
            collector,
            scheduler,
            settings,
        }
    }

    async fn run_engine(&self, target: &ScraperTarget) -> Result<ScrapeStats, ScrapeFailure> {
        if wants_headless(target, &self.settings) {
            let engine = HeadlessEngine::launch(&self.settings, self.rows.clone()).await?;
            let result = engine.scrape_target(target).await;
            engine.close().await;
            return result;
        }

        if target.use_headless {
            debug!("Headless browser disabled, using static collector");
        }
        self.collector.scrape_target(target).await
    }
}

#[async_trait]
impl JobHandler for ScrapeTargetHandler {
    fn job_type(&self) -> JobType {
        JobType::ScrapeTarget
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let payload: ScrapeTargetPayload = job.decode()?;
        let target = self
            .targets
            .find_by_id(payload.target_id)
            .await?
            .ok_or_else(|| JobError::Permanent(format!("target {} not found", payload.target_id)))?;

        if !target.enabled {
            info!(target = %target.name, "Target disabled, skipping");
            return Ok(());
        }

        let mut run = self.runs.create(&ScraperRun::pending(target.id)).await?;
        run.start();
        let mut run = self.runs.update(&run).await?;

        match self.run_engine(&target).await {
            Ok(stats) => {
                info!(
                    target = %target.name,
                    pages = stats.total_pages,
                    extracted = stats.data_extracted,
                    "Scrape job completed"
                );
                run.complete(stats);
                self.runs.update(&run).await?;

                self.scheduler
                    .enqueue(&EnrichDataPayload {
                        target_id: target.id,
                    })
                    .await?;
                self.scheduler
                    .enqueue(&DedupeDataPayload {
                        target_id: target.id,
                    })
                    .await?;
                Ok(())
            }
            Err(failure) => {
                warn!(target = %target.name, "Scrape job failed: {}", failure.error);
                run.fail(Some(failure.stats), failure.error.to_string());
                self.runs.update(&run).await?;
                Err(failure.error.into())
            }
        }
    }
}

/// `scrape:all` 处理器
///
/// 只负责扇出，为每个启用的目标入队一个 `scrape:target`，然后安排下一次全量抓取
pub struct ScrapeAllHandler {
    targets: Arc<dyn TargetRepository>,
    scheduler: JobScheduler,
    schedule: ScheduleSettings,
}

impl ScrapeAllHandler {
    pub fn new(
        targets: Arc<dyn TargetRepository>,
        scheduler: JobScheduler,
        schedule: &ScheduleSettings,
    ) -> Self {
        Self {
            targets,
            scheduler,
            schedule: schedule.clone(),
        }
    }
}

#[async_trait]
impl JobHandler for ScrapeAllHandler {
    fn job_type(&self) -> JobType {
        JobType::ScrapeAll
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let payload: ScrapeAllPayload = job.decode()?;
        let every = self.schedule.scrape_all_interval().ok_or_else(|| {
            JobError::Permanent(format!(
                "invalid scrape_all_every_hours: {}",
                self.schedule.scrape_all_every_hours
            ))
        })?;
        info!(force = payload.force, "Starting scrape all job");

        let targets = self.targets.list_enabled().await?;
        let mut enqueued = 0usize;
        let mut last_error = None;
        for target in &targets {
            match self
                .scheduler
                .enqueue(&ScrapeTargetPayload {
                    target_id: target.id,
                })
                .await
            {
                Ok(_) => enqueued += 1,
                Err(e) => {
                    warn!(target = %target.name, "Failed to enqueue target: {}", e);
                    last_error = Some(e);
                }
            }
        }

        // Retrying after a partial fan-out would duplicate the targets already enqueued
        if enqueued == 0 {
            if let Some(e) = last_error {
                return Err(e.into());
            }
        }
        info!("Enqueued {} scrape jobs", enqueued);

        self.scheduler
            .schedule_next(&ScrapeAllPayload { force: false }, every)
            .await?;
        Ok(())
    }
}
