// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::quote_workflow::QuoteWorkflow;
use crate::config::settings::ScraperSettings;
use crate::domain::models::job::{Job, JobType, ScrapeQuotePayload};
use crate::engines::field_registry::FieldRegistry;
use crate::engines::insurance_scraper::InsuranceScraper;
use crate::engines::quote_fetcher::{FallbackQuoteFetcher, LiveQuoteFetcher, SimulatedQuoteFetcher};
use crate::utils::errors::JobError;
use crate::workers::worker::JobHandler;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// `quote:scrape` 处理器
///
/// 每个作业独占一个浏览器会话；浏览器不可用时整批报价改用模拟并记录原因
pub struct QuoteScrapeHandler {
    workflow: Arc<QuoteWorkflow>,
    registry: Arc<FieldRegistry>,
    settings: ScraperSettings,
}

impl QuoteScrapeHandler {
    pub fn new(
        workflow: Arc<QuoteWorkflow>,
        registry: Arc<FieldRegistry>,
        settings: ScraperSettings,
    ) -> Self {
        Self {
            workflow,
            registry,
            settings,
        }
    }
}

#[async_trait]
impl JobHandler for QuoteScrapeHandler {
    fn job_type(&self) -> JobType {
        JobType::QuoteScrape
    }

    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        let payload: ScrapeQuotePayload = job.decode()?;
        let simulated = SimulatedQuoteFetcher::new(&self.settings);

        if !self.settings.headless_enabled {
            let fallback = simulated.with_fallback_reason("headless browser disabled");
            let offers = self.workflow.scrape_quote(payload.quote_id, &fallback).await?;
            info!(quote_id = %payload.quote_id, offers = offers.len(), "Quote scraped");
            return Ok(());
        }

        let offers = match InsuranceScraper::launch(&self.settings, self.registry.clone()).await {
            Ok(scraper) => {
                let fetcher = FallbackQuoteFetcher::new(LiveQuoteFetcher::new(&scraper), simulated);
                let result = self.workflow.scrape_quote(payload.quote_id, &fetcher).await;
                scraper.close().await;
                result?
            }
            Err(e) => {
                warn!("Browser unavailable, using simulated quotes: {}", e);
                let fallback = simulated.with_fallback_reason(e.to_string());
                self.workflow.scrape_quote(payload.quote_id, &fallback).await?
            }
        };

        info!(quote_id = %payload.quote_id, offers = offers.len(), "Quote scraped");
        Ok(())
    }
}
