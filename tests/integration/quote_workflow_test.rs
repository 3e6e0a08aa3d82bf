// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{fast_scraper_settings, TestContext, COMPANIES};
use async_trait::async_trait;
use quotrs::application::dto::quote_request::CreateQuoteRequestDto;
use quotrs::application::use_cases::quote_workflow::{QuoteWorkflow, WorkflowError};
use quotrs::domain::models::customer::CustomerProfile;
use quotrs::domain::models::job::{JobType, Lane};
use quotrs::domain::models::policy::Policy;
use quotrs::domain::models::quote::{Quote, QuoteStatus};
use quotrs::domain::models::scraped_quote::{OfferStatus, QuoteOffer, ScrapedQuote};
use quotrs::domain::models::scraped_row::InsertOutcome;
use quotrs::domain::models::target::ScraperTarget;
use quotrs::domain::repositories::quote_repository::QuoteRepository;
use quotrs::domain::repositories::RepositoryError;
use quotrs::engines::quote_fetcher::{QuoteFetcher, SimulatedQuoteFetcher};
use quotrs::engines::traits::EngineError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn workflow(ctx: &TestContext) -> QuoteWorkflow {
    QuoteWorkflow::new(
        ctx.customers.clone(),
        ctx.quotes.clone(),
        ctx.targets.clone(),
        ctx.scheduler.clone(),
        Duration::ZERO,
    )
}

fn request(customer_id: Uuid) -> CreateQuoteRequestDto {
    CreateQuoteRequestDto {
        customer_id,
        product_id: None,
        agent_id: None,
        vehicle_plate: Some("34ABC123".to_string()),
        vehicle_year: Some(2020),
        vehicle_brand: Some("Renault".to_string()),
        vehicle_model: Some("Clio".to_string()),
        coverage_type: Some("kasko".to_string()),
        start_date: None,
        end_date: None,
        additional_info: None,
    }
}

async fn seed_companies(ctx: &TestContext) {
    for company in COMPANIES {
        let host = company.to_lowercase().replace(' ', "");
        ctx.add_target(company, &format!("https://www.{}.com.tr", host))
            .await;
    }
}

/// 对指定公司返回错误，其余公司走模拟报价
struct FlakyFetcher {
    broken: &'static str,
    simulated: SimulatedQuoteFetcher,
}

#[async_trait]
impl QuoteFetcher for FlakyFetcher {
    async fn fetch(
        &self,
        target: &ScraperTarget,
        profile: &CustomerProfile,
        quote_id: Uuid,
    ) -> Result<QuoteOffer, EngineError> {
        if target.name == self.broken {
            return Err(EngineError::FormAutomation("submit button not found".to_string()));
        }
        self.simulated.fetch(target, profile, quote_id).await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// 模拟慢速站点并统计调用次数
struct SlowFetcher {
    delay: Duration,
    calls: AtomicUsize,
    simulated: SimulatedQuoteFetcher,
}

impl SlowFetcher {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
            simulated: SimulatedQuoteFetcher::new(&fast_scraper_settings()),
        }
    }
}

#[async_trait]
impl QuoteFetcher for SlowFetcher {
    async fn fetch(
        &self,
        target: &ScraperTarget,
        profile: &CustomerProfile,
        quote_id: Uuid,
    ) -> Result<QuoteOffer, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.simulated.fetch(target, profile, quote_id).await
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// 第一次批准时报告保单号冲突，其余调用交给真实仓库
struct CollidingQuotes {
    inner: Arc<dyn QuoteRepository>,
    collisions: AtomicUsize,
}

#[async_trait]
impl QuoteRepository for CollidingQuotes {
    async fn create(&self, quote: &Quote) -> Result<Quote, RepositoryError> {
        self.inner.create(quote).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Quote>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn transition(
        &self,
        id: Uuid,
        from: QuoteStatus,
        to: QuoteStatus,
    ) -> Result<bool, RepositoryError> {
        self.inner.transition(id, from, to).await
    }

    async fn create_offer(&self, offer: &ScrapedQuote) -> Result<InsertOutcome, RepositoryError> {
        self.inner.create_offer(offer).await
    }

    async fn has_offer(&self, quote_id: Uuid, company_name: &str) -> Result<bool, RepositoryError> {
        self.inner.has_offer(quote_id, company_name).await
    }

    async fn find_offer(&self, id: Uuid) -> Result<Option<ScrapedQuote>, RepositoryError> {
        self.inner.find_offer(id).await
    }

    async fn list_offers_by_price(&self, quote_id: Uuid) -> Result<Vec<ScrapedQuote>, RepositoryError> {
        self.inner.list_offers_by_price(quote_id).await
    }

    async fn approve(&self, quote_id: Uuid, policy: &Policy) -> Result<Policy, RepositoryError> {
        if self.collisions.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(RepositoryError::Duplicate(
                "uq_policies_policy_number".to_string(),
            ));
        }
        self.inner.approve(quote_id, policy).await
    }
}

#[tokio::test]
async fn test_create_quote_requires_customer() {
    let ctx = TestContext::new().await;
    let err = workflow(&ctx)
        .create_quote(request(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound("customer")));
}

#[tokio::test]
async fn test_create_quote_rejects_invalid_vehicle_year() {
    let ctx = TestContext::new().await;
    let customer = ctx.add_customer().await;
    let mut dto = request(customer.id);
    dto.vehicle_year = Some(1800);

    let err = workflow(&ctx).create_quote(dto).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
}

#[tokio::test]
async fn test_create_quote_enqueues_critical_scrape() {
    let ctx = TestContext::new().await;
    let customer = ctx.add_customer().await;

    let quote = workflow(&ctx).create_quote(request(customer.id)).await.unwrap();
    assert_eq!(quote.status, QuoteStatus::Pending);

    let job = ctx.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(job.job_type, JobType::QuoteScrape);
    assert_eq!(job.queue, Lane::Critical);
    assert_eq!(job.payload["quote_id"], quote.id.to_string());
}

#[tokio::test]
async fn test_scrape_produces_one_offer_per_target_sorted_by_price() {
    let ctx = TestContext::new().await;
    seed_companies(&ctx).await;
    let customer = ctx.add_customer().await;
    let workflow = workflow(&ctx);
    let quote = workflow.create_quote(request(customer.id)).await.unwrap();

    let fetcher = SimulatedQuoteFetcher::new(&fast_scraper_settings());
    let offers = workflow.scrape_quote(quote.id, &fetcher).await.unwrap();

    assert_eq!(offers.len(), 5);
    let prices: Vec<f64> = offers.iter().map(|o| o.final_price).collect();
    let mut sorted = prices.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(prices, sorted);

    let cheapest = &offers[0];
    assert_eq!(cheapest.company_name, "Allianz");
    assert_eq!(cheapest.premium, 1425.0);
    assert_eq!(cheapest.final_price, 1282.5);
    assert_eq!(cheapest.raw_data.as_ref().unwrap()["source"], "simulated");

    let (stored, listed) = workflow.list_offers(quote.id).await.unwrap();
    assert_eq!(stored.status, QuoteStatus::Completed);
    assert_eq!(listed.len(), 5);

    // A redelivered job does not duplicate offers
    let again = workflow.scrape_quote(quote.id, &fetcher).await.unwrap();
    assert_eq!(again.len(), 5);
}

#[tokio::test]
async fn test_failed_target_is_recorded_and_not_approvable() {
    let ctx = TestContext::new().await;
    seed_companies(&ctx).await;
    let customer = ctx.add_customer().await;
    let workflow = workflow(&ctx);
    let quote = workflow.create_quote(request(customer.id)).await.unwrap();

    let fetcher = FlakyFetcher {
        broken: "Mapfre",
        simulated: SimulatedQuoteFetcher::new(&fast_scraper_settings()),
    };
    let offers = workflow.scrape_quote(quote.id, &fetcher).await.unwrap();
    assert_eq!(offers.len(), 5);

    let failed = offers
        .iter()
        .find(|o| o.status == OfferStatus::Error)
        .expect("error record for the broken company");
    assert_eq!(failed.company_name, "Mapfre");
    assert!(failed
        .error_message
        .as_deref()
        .unwrap()
        .contains("submit button not found"));

    let err = workflow.approve(quote.id, failed.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::OfferNotApprovable(_)));
}

#[tokio::test]
async fn test_approve_rules() {
    let ctx = TestContext::new().await;
    seed_companies(&ctx).await;
    let customer = ctx.add_customer().await;
    let workflow = workflow(&ctx);
    let fetcher = SimulatedQuoteFetcher::new(&fast_scraper_settings());

    let quote = workflow.create_quote(request(customer.id)).await.unwrap();
    let other = workflow.create_quote(request(customer.id)).await.unwrap();

    // Pending quotes cannot be approved
    let err = workflow.approve(other.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition(_)));

    let offers = workflow.scrape_quote(quote.id, &fetcher).await.unwrap();
    let other_offers = workflow.scrape_quote(other.id, &fetcher).await.unwrap();

    let err = workflow
        .approve(quote.id, other_offers[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::OfferMismatch { .. }));

    let chosen = &offers[2];
    let policy = workflow.approve(quote.id, chosen.id).await.unwrap();
    assert_eq!(policy.premium, chosen.final_price);
    assert_eq!(policy.company_name, chosen.company_name);
    assert!(policy.policy_number.starts_with("POL-"));

    let stored = ctx.policies.find_by_quote(quote.id).await.unwrap().unwrap();
    assert_eq!(stored.policy_number, policy.policy_number);
    let (approved, _) = workflow.list_offers(quote.id).await.unwrap();
    assert_eq!(approved.status, QuoteStatus::Approved);

    let err = workflow.approve(quote.id, chosen.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_overlapping_deliveries_store_one_offer_per_target() {
    let ctx = TestContext::new().await;
    seed_companies(&ctx).await;
    let customer = ctx.add_customer().await;
    let workflow = workflow(&ctx);
    let quote = workflow.create_quote(request(customer.id)).await.unwrap();

    let fetcher = SlowFetcher::new(Duration::from_millis(50));
    let (a, b) = tokio::join!(
        workflow.scrape_quote(quote.id, &fetcher),
        workflow.scrape_quote(quote.id, &fetcher)
    );

    assert_eq!(a.unwrap().len(), 5);
    assert_eq!(b.unwrap().len(), 5);

    let (stored, offers) = workflow.list_offers(quote.id).await.unwrap();
    assert_eq!(stored.status, QuoteStatus::Completed);
    assert_eq!(offers.len(), 5);
    let mut companies: Vec<_> = offers.iter().map(|o| o.company_name.as_str()).collect();
    companies.sort();
    companies.dedup();
    assert_eq!(companies.len(), 5);
}

#[tokio::test]
async fn test_resumed_scrape_fetches_only_missing_companies() {
    let ctx = TestContext::new().await;
    seed_companies(&ctx).await;
    let customer = ctx.add_customer().await;
    let workflow = workflow(&ctx);
    let quote = workflow.create_quote(request(customer.id)).await.unwrap();

    // A crashed attempt already claimed the quote and stored two offers
    assert!(ctx
        .quotes
        .transition(quote.id, QuoteStatus::Pending, QuoteStatus::Processing)
        .await
        .unwrap());
    let simulated = SimulatedQuoteFetcher::new(&fast_scraper_settings());
    let mut earlier = Vec::new();
    for company in ["Allianz", "Mapfre"] {
        let target = ScraperTarget::new(company, "https://example.com.tr");
        let record =
            ScrapedQuote::from_offer(quote.id, None, &simulated.offer(&target, quote.id, None));
        assert_eq!(
            ctx.quotes.create_offer(&record).await.unwrap(),
            InsertOutcome::Inserted
        );
        earlier.push(record.id);
    }

    let fetcher = SlowFetcher::new(Duration::ZERO);
    let offers = workflow.scrape_quote(quote.id, &fetcher).await.unwrap();

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    assert_eq!(offers.len(), 5);
    for id in earlier {
        assert!(offers.iter().any(|o| o.id == id));
    }
    let (stored, _) = workflow.list_offers(quote.id).await.unwrap();
    assert_eq!(stored.status, QuoteStatus::Completed);
}

#[tokio::test]
async fn test_approve_regenerates_colliding_policy_number() {
    let ctx = TestContext::new().await;
    seed_companies(&ctx).await;
    let customer = ctx.add_customer().await;
    let quotes = Arc::new(CollidingQuotes {
        inner: ctx.quotes.clone(),
        collisions: AtomicUsize::new(0),
    });
    let workflow = QuoteWorkflow::new(
        ctx.customers.clone(),
        quotes.clone(),
        ctx.targets.clone(),
        ctx.scheduler.clone(),
        Duration::ZERO,
    );

    let quote = workflow.create_quote(request(customer.id)).await.unwrap();
    let fetcher = SimulatedQuoteFetcher::new(&fast_scraper_settings());
    let offers = workflow.scrape_quote(quote.id, &fetcher).await.unwrap();

    let policy = workflow.approve(quote.id, offers[0].id).await.unwrap();
    assert_eq!(quotes.collisions.load(Ordering::SeqCst), 2);
    assert_eq!(policy.premium, offers[0].final_price);
    let (approved, _) = workflow.list_offers(quote.id).await.unwrap();
    assert_eq!(approved.status, QuoteStatus::Approved);
}
