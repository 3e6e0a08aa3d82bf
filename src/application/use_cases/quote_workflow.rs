// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::quote_request::CreateQuoteRequestDto;
use crate::domain::models::customer::CustomerProfile;
use crate::domain::models::job::ScrapeQuotePayload;
use crate::domain::models::policy::Policy;
use crate::domain::models::quote::{InvalidTransition, Quote, QuoteStatus};
use crate::domain::models::scraped_quote::{OfferStatus, ScrapedQuote};
use crate::domain::models::scraped_row::InsertOutcome;
use crate::domain::repositories::customer_repository::CustomerRepository;
use crate::domain::repositories::quote_repository::QuoteRepository;
use crate::domain::repositories::target_repository::TargetRepository;
use crate::engines::quote_fetcher::QuoteFetcher;
use crate::queue::job_queue::QueueError;
use crate::queue::scheduler::JobScheduler;
use crate::utils::errors::{JobError, RepositoryError};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("Offer {offer_id} does not belong to quote {quote_id}")]
    OfferMismatch { offer_id: Uuid, quote_id: Uuid },
    #[error("Offer {0} has error status and cannot be approved")]
    OfferNotApprovable(Uuid),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl From<WorkflowError> for JobError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Repository(e) => e.into(),
            WorkflowError::Queue(e) => e.into(),
            other => JobError::Permanent(other.to_string()),
        }
    }
}

/// 报价聚合流程
///
/// 报价请求的生命周期：创建 → 抓取各公司报价 → 按价格排序 → 批准出单
pub struct QuoteWorkflow {
    customers: Arc<dyn CustomerRepository>,
    quotes: Arc<dyn QuoteRepository>,
    targets: Arc<dyn TargetRepository>,
    scheduler: JobScheduler,
    delay_between_targets: Duration,
}

impl QuoteWorkflow {
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        quotes: Arc<dyn QuoteRepository>,
        targets: Arc<dyn TargetRepository>,
        scheduler: JobScheduler,
        delay_between_targets: Duration,
    ) -> Self {
        Self {
            customers,
            quotes,
            targets,
            scheduler,
            delay_between_targets,
        }
    }

    /// 创建报价请求并入队 `quote:scrape`
    #[instrument(skip(self, dto), fields(customer_id = %dto.customer_id))]
    pub async fn create_quote(&self, dto: CreateQuoteRequestDto) -> Result<Quote, WorkflowError> {
        dto.validate()
            .map_err(|e| WorkflowError::Validation(e.to_string()))?;

        if self.customers.find_by_id(dto.customer_id).await?.is_none() {
            return Err(WorkflowError::NotFound("customer"));
        }

        let mut quote = Quote::new(dto.customer_id);
        quote.product_id = dto.product_id;
        quote.agent_id = dto.agent_id;
        quote.vehicle_plate = dto.vehicle_plate;
        quote.vehicle_year = dto.vehicle_year;
        quote.vehicle_brand = dto.vehicle_brand;
        quote.vehicle_model = dto.vehicle_model;
        quote.coverage_type = dto.coverage_type;
        quote.start_date = dto.start_date;
        quote.end_date = dto.end_date;
        quote.additional_info = dto.additional_info;

        let quote = self.quotes.create(&quote).await?;
        self.scheduler
            .enqueue(&ScrapeQuotePayload { quote_id: quote.id })
            .await?;

        info!(quote_id = %quote.id, "Quote created");
        Ok(quote)
    }

    /// 为报价请求抓取所有活跃目标的报价
    ///
    /// 每个目标恰好保存一条报价（失败时保存错误记录），单个目标失败不会中断循环。
    /// 重复投递时跳过已有报价的公司，`(quote_id, company_name)` 唯一索引保证
    /// 并发执行也不会多写；已完成的请求直接返回现有报价。
    #[instrument(skip(self, fetcher), fields(strategy = fetcher.name()))]
    pub async fn scrape_quote(
        &self,
        quote_id: Uuid,
        fetcher: &dyn QuoteFetcher,
    ) -> Result<Vec<ScrapedQuote>, WorkflowError> {
        let mut quote = self
            .quotes
            .find_by_id(quote_id)
            .await?
            .ok_or(WorkflowError::NotFound("quote"))?;

        if quote.status == QuoteStatus::Pending
            && !self
                .quotes
                .transition(quote_id, QuoteStatus::Pending, QuoteStatus::Processing)
                .await?
        {
            quote = self
                .quotes
                .find_by_id(quote_id)
                .await?
                .ok_or(WorkflowError::NotFound("quote"))?;
            warn!(status = %quote.status, "Quote was claimed concurrently");
        }

        match quote.status {
            QuoteStatus::Completed | QuoteStatus::Approved => {
                info!(status = %quote.status, "Quote already scraped");
                return Ok(self.quotes.list_offers_by_price(quote_id).await?);
            }
            // A previous attempt crashed mid-loop or another delivery is running
            QuoteStatus::Processing => info!("Resuming quote scrape"),
            QuoteStatus::Pending => {}
        }

        let customer = self
            .customers
            .find_by_id(quote.customer_id)
            .await?
            .ok_or(WorkflowError::NotFound("customer"))?;
        let profile = CustomerProfile::build(&customer, &quote);

        let targets = self.targets.list_active().await?;
        let mut fetched = 0usize;

        for target in &targets {
            if self.quotes.has_offer(quote_id, &target.name).await? {
                debug!(company = %target.name, "Offer already stored");
                continue;
            }
            if fetched > 0 && !self.delay_between_targets.is_zero() {
                tokio::time::sleep(self.delay_between_targets).await;
            }
            fetched += 1;

            let (record, source) = match fetcher.fetch(target, &profile, quote_id).await {
                Ok(offer) => (
                    ScrapedQuote::from_offer(quote_id, target.logo_url.clone(), &offer),
                    offer.source.label(),
                ),
                Err(e) => {
                    warn!(company = %target.name, "Quote fetch failed: {}", e);
                    let failed = ScrapedQuote::failed(
                        quote_id,
                        target.name.clone(),
                        target.logo_url.clone(),
                        e.to_string(),
                    );
                    (failed, "error")
                }
            };

            match self.quotes.create_offer(&record).await? {
                InsertOutcome::Inserted => {
                    counter!("quote_offers_total", "source" => source).increment(1)
                }
                InsertOutcome::Duplicate => {
                    debug!(company = %target.name, "Offer stored concurrently, discarding")
                }
            }
        }

        self.quotes
            .transition(quote_id, QuoteStatus::Processing, QuoteStatus::Completed)
            .await?;

        let offers = self.quotes.list_offers_by_price(quote_id).await?;
        info!(offers = offers.len(), fetched, "Quote scrape completed");
        Ok(offers)
    }

    /// 报价列表，按最终价格升序
    pub async fn list_offers(
        &self,
        quote_id: Uuid,
    ) -> Result<(Quote, Vec<ScrapedQuote>), WorkflowError> {
        let quote = self
            .quotes
            .find_by_id(quote_id)
            .await?
            .ok_or(WorkflowError::NotFound("quote"))?;
        let offers = self.quotes.list_offers_by_price(quote_id).await?;
        Ok((quote, offers))
    }

    /// 批准调用方指定的报价并出单
    #[instrument(skip(self))]
    pub async fn approve(&self, quote_id: Uuid, offer_id: Uuid) -> Result<Policy, WorkflowError> {
        let quote = self
            .quotes
            .find_by_id(quote_id)
            .await?
            .ok_or(WorkflowError::NotFound("quote"))?;

        if !quote.status.can_transition_to(QuoteStatus::Approved) {
            return Err(InvalidTransition {
                from: quote.status,
                to: QuoteStatus::Approved,
            }
            .into());
        }

        let offer = self
            .quotes
            .find_offer(offer_id)
            .await?
            .ok_or(WorkflowError::NotFound("offer"))?;
        if offer.quote_id != quote_id {
            return Err(WorkflowError::OfferMismatch { offer_id, quote_id });
        }
        if offer.status == OfferStatus::Error {
            return Err(WorkflowError::OfferNotApprovable(offer_id));
        }

        let policy = match self
            .quotes
            .approve(quote_id, &Policy::issue(&quote, &offer))
            .await
        {
            // Random policy number collided
            Err(RepositoryError::Duplicate(detail)) => {
                warn!(%detail, "Policy number collision, regenerating");
                self.quotes
                    .approve(quote_id, &Policy::issue(&quote, &offer))
                    .await?
            }
            other => other?,
        };
        info!(policy_number = %policy.policy_number, company = %policy.company_name, "Policy issued");
        Ok(policy)
    }
}
