// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{fast_scraper_settings, TestContext, COMPANIES};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use quotrs::application::dto::quote_request::CreateQuoteRequestDto;
use quotrs::application::use_cases::quote_workflow::QuoteWorkflow;
use quotrs::config::settings::ScheduleSettings;
use quotrs::domain::models::job::{
    CleanupOldDataPayload, DedupeDataPayload, EnrichDataPayload, Job, JobStatus, JobType,
    ScrapeAllPayload, ScrapeQuotePayload, ScrapeTargetPayload,
};
use quotrs::domain::models::quote::QuoteStatus;
use quotrs::domain::models::scrape_run::RunStatus;
use quotrs::domain::models::scraped_row::{FieldMap, ScrapedRow};
use quotrs::domain::repositories::job_repository::JobRepository;
use quotrs::domain::repositories::scraped_row_repository::DuplicateHash;
use quotrs::engines::field_registry::FieldRegistry;
use quotrs::engines::static_collector::StaticCollector;
use quotrs::infrastructure::database::entities::scraped_row as row_entity;
use quotrs::utils::errors::JobError;
use quotrs::workers::handlers::{
    CleanupOldDataHandler, DedupeDataHandler, EnrichDataHandler, QuoteScrapeHandler,
    ScrapeAllHandler, ScrapeTargetHandler,
};
use quotrs::workers::{HandlerRegistry, JobHandler, JobWorker};
use sea_orm::{ActiveModelTrait, ConnectionTrait};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 固定返回某个结果的处理器
struct StubHandler {
    result: fn() -> Result<(), JobError>,
}

#[async_trait]
impl JobHandler for StubHandler {
    fn job_type(&self) -> JobType {
        JobType::ScrapeAll
    }

    async fn handle(&self, _job: &Job) -> Result<(), JobError> {
        (self.result)()
    }
}

fn worker_with(ctx: &TestContext, result: Option<fn() -> Result<(), JobError>>) -> JobWorker {
    let registry = match result {
        Some(result) => HandlerRegistry::new().register(Arc::new(StubHandler { result })),
        None => HandlerRegistry::new(),
    };
    JobWorker::new(
        ctx.scheduler.clone(),
        Arc::new(registry),
        Duration::from_millis(10),
    )
}

async fn reload(ctx: &TestContext, id: Uuid) -> Job {
    ctx.jobs.find_by_id(id).await.unwrap().unwrap()
}

async fn queued_of(ctx: &TestContext, job_type: JobType) -> Vec<Job> {
    ctx.jobs
        .list_by_status(JobStatus::Queued, 100)
        .await
        .unwrap()
        .into_iter()
        .filter(|job| job.job_type == job_type)
        .collect()
}

#[tokio::test]
async fn test_worker_completes_successful_job() {
    let ctx = TestContext::new().await;
    let job = ctx.scheduler.enqueue(&ScrapeAllPayload { force: false }).await.unwrap();

    let worker = worker_with(&ctx, Some(|| Ok(())));
    assert!(worker.process_next().await.unwrap());
    assert!(!worker.process_next().await.unwrap());

    let job = reload(&ctx, job.id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.completed_at.is_some());
}

#[tokio::test]
async fn test_worker_buries_permanent_failure() {
    let ctx = TestContext::new().await;
    let job = ctx.scheduler.enqueue(&ScrapeAllPayload { force: false }).await.unwrap();

    let worker = worker_with(&ctx, Some(|| Err(JobError::Permanent("bad payload".into()))));
    worker.process_next().await.unwrap();

    let job = reload(&ctx, job.id).await;
    assert_eq!(job.status, JobStatus::Dead);
    assert_eq!(job.last_error.as_deref(), Some("bad payload"));
}

#[tokio::test]
async fn test_worker_requeues_retryable_failure() {
    let ctx = TestContext::new().await;
    let job = ctx.scheduler.enqueue(&ScrapeAllPayload { force: false }).await.unwrap();

    let worker = worker_with(&ctx, Some(|| Err(JobError::Retryable("timeout".into()))));
    worker.process_next().await.unwrap();

    let job = reload(&ctx, job.id).await;
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.attempt_count, 1);
    assert!(job.run_at > Utc::now().fixed_offset());
    // Backoff keeps it out of reach for now
    assert!(!worker.process_next().await.unwrap());
}

#[tokio::test]
async fn test_worker_buries_job_without_handler() {
    let ctx = TestContext::new().await;
    let job = ctx.scheduler.enqueue(&ScrapeAllPayload { force: false }).await.unwrap();

    worker_with(&ctx, None).process_next().await.unwrap();

    let job = reload(&ctx, job.id).await;
    assert_eq!(job.status, JobStatus::Dead);
    assert!(job.last_error.unwrap().contains("no handler"));
}

#[tokio::test]
async fn test_scrape_all_fans_out_enabled_targets_and_rearms() {
    let ctx = TestContext::new().await;
    for company in COMPANIES {
        ctx.add_target(company, "https://example.com").await;
    }
    for name in ["Eski Hedef", "Bakımda"] {
        let mut target = ctx.add_target(name, "https://example.org").await;
        target.enabled = false;
        ctx.targets.update(&target).await.unwrap();
    }

    let handler = ScrapeAllHandler::new(
        ctx.targets.clone(),
        ctx.scheduler.clone(),
        &ScheduleSettings::default(),
    );
    let job = Job::from_payload(&ScrapeAllPayload { force: true }).unwrap();
    handler.handle(&job).await.unwrap();

    assert_eq!(queued_of(&ctx, JobType::ScrapeTarget).await.len(), 5);
    let next = queued_of(&ctx, JobType::ScrapeAll).await;
    assert_eq!(next.len(), 1);
    assert!(next[0].run_at > (Utc::now() + ChronoDuration::hours(23)).fixed_offset());
    assert_eq!(next[0].payload, json!({"force": false}));
}

#[tokio::test]
async fn test_scrape_all_with_unusable_interval_is_permanent() {
    let ctx = TestContext::new().await;
    ctx.add_target("Allianz", "https://example.com").await;

    let schedule = ScheduleSettings {
        scrape_all_every_hours: i64::MAX,
        ..Default::default()
    };
    let handler = ScrapeAllHandler::new(ctx.targets.clone(), ctx.scheduler.clone(), &schedule);
    let job = Job::from_payload(&ScrapeAllPayload { force: false }).unwrap();

    let err = handler.handle(&job).await.unwrap_err();
    assert!(matches!(err, JobError::Permanent(_)));
    assert!(queued_of(&ctx, JobType::ScrapeTarget).await.is_empty());
}

async fn scrape_target_handler(ctx: &TestContext) -> ScrapeTargetHandler {
    let settings = fast_scraper_settings();
    let collector = StaticCollector::new(&settings, ctx.rows.clone()).unwrap();
    ScrapeTargetHandler::new(
        ctx.targets.clone(),
        ctx.runs.clone(),
        ctx.rows.clone(),
        Arc::new(collector),
        ctx.scheduler.clone(),
        settings,
    )
}

#[tokio::test]
async fn test_scrape_target_records_run_and_enqueues_followups() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<h1>Trafik Sigortası</h1><p>Teklif alın</p>"),
        )
        .mount(&server)
        .await;

    let ctx = TestContext::new().await;
    let target = ctx.add_target("Trafik", &server.uri()).await;
    let handler = scrape_target_handler(&ctx).await;
    let job = Job::from_payload(&ScrapeTargetPayload { target_id: target.id }).unwrap();

    handler.handle(&job).await.unwrap();

    let runs = ctx.runs.list_by_target(target.id, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Completed);
    assert_eq!(runs[0].stats.as_ref().unwrap().data_extracted, 1);
    assert!(runs[0].finished_at.is_some());

    assert_eq!(queued_of(&ctx, JobType::ScrapeEnrich).await.len(), 1);
    assert_eq!(queued_of(&ctx, JobType::ScrapeDedupe).await.len(), 1);
}

#[tokio::test]
async fn test_scrape_target_failure_marks_run_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let ctx = TestContext::new().await;
    let target = ctx.add_target("Trafik", &server.uri()).await;
    let handler = scrape_target_handler(&ctx).await;
    let job = Job::from_payload(&ScrapeTargetPayload { target_id: target.id }).unwrap();

    let err = handler.handle(&job).await.unwrap_err();
    assert!(matches!(err, JobError::Permanent(_)));

    let runs = ctx.runs.list_by_target(target.id, 10).await.unwrap();
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert!(runs[0].error_msg.is_some());
    assert_eq!(runs[0].stats.as_ref().unwrap().error_pages, 1);
    assert!(queued_of(&ctx, JobType::ScrapeEnrich).await.is_empty());
}

#[tokio::test]
async fn test_scrape_target_unknown_target_is_permanent() {
    let ctx = TestContext::new().await;
    let handler = scrape_target_handler(&ctx).await;
    let job = Job::from_payload(&ScrapeTargetPayload {
        target_id: Uuid::new_v4(),
    })
    .unwrap();

    let err = handler.handle(&job).await.unwrap_err();
    assert!(matches!(err, JobError::Permanent(_)));
}

#[tokio::test]
async fn test_quote_scrape_without_browser_uses_simulated_offers() {
    let ctx = TestContext::new().await;
    for company in COMPANIES {
        ctx.add_target(company, "https://example.com").await;
    }
    let customer = ctx.add_customer().await;
    let workflow = Arc::new(QuoteWorkflow::new(
        ctx.customers.clone(),
        ctx.quotes.clone(),
        ctx.targets.clone(),
        ctx.scheduler.clone(),
        Duration::ZERO,
    ));
    let quote = workflow
        .create_quote(CreateQuoteRequestDto {
            customer_id: customer.id,
            product_id: None,
            agent_id: None,
            vehicle_plate: None,
            vehicle_year: None,
            vehicle_brand: None,
            vehicle_model: None,
            coverage_type: None,
            start_date: None,
            end_date: None,
            additional_info: None,
        })
        .await
        .unwrap();

    let handler = QuoteScrapeHandler::new(
        workflow.clone(),
        Arc::new(FieldRegistry::builtin()),
        fast_scraper_settings(),
    );
    let job = Job::from_payload(&ScrapeQuotePayload { quote_id: quote.id }).unwrap();
    handler.handle(&job).await.unwrap();

    let (quote, offers) = workflow.list_offers(quote.id).await.unwrap();
    assert_eq!(quote.status, QuoteStatus::Completed);
    assert_eq!(offers.len(), 5);
    for offer in &offers {
        let raw = offer.raw_data.as_ref().unwrap();
        assert_eq!(raw["source"], "simulated");
        assert_eq!(raw["fallback_reason"], "headless browser disabled");
    }
}

fn row(target_id: Uuid, hash: &str, city: &str, age_days: i64) -> ScrapedRow {
    let normalized: FieldMap = [("city".to_string(), json!(city))].into_iter().collect();
    let mut row = ScrapedRow::new(
        target_id,
        hash.to_string(),
        "https://example.com/iletisim".to_string(),
        "contact".to_string(),
        normalized.clone(),
        normalized,
    );
    row.created_at = (Utc::now() - ChronoDuration::days(age_days)).fixed_offset();
    row
}

#[tokio::test]
async fn test_enrich_adds_canonical_city() {
    let ctx = TestContext::new().await;
    let target = ctx.add_target("Anadolu Sigorta iletişim", "https://example.com").await;
    ctx.rows
        .insert_if_absent(&row(target.id, "h-ist", "istanbul", 0))
        .await
        .unwrap();

    let handler = EnrichDataHandler::new(ctx.rows.clone());
    let job = Job::from_payload(&EnrichDataPayload { target_id: target.id }).unwrap();
    handler.handle(&job).await.unwrap();

    let rows = ctx.rows.list_by_target(target.id).await.unwrap();
    assert_eq!(rows[0].normalized["city_normalized"], json!("İstanbul"));
    assert_eq!(rows[0].raw["city"], json!("istanbul"));
}

#[tokio::test]
async fn test_cleanup_removes_old_rows_and_rearms() {
    let ctx = TestContext::new().await;
    let target = ctx.add_target("Anadolu Sigorta iletişim", "https://example.com").await;
    ctx.rows
        .insert_if_absent(&row(target.id, "h-old", "izmir", 45))
        .await
        .unwrap();
    ctx.rows
        .insert_if_absent(&row(target.id, "h-new", "ankara", 1))
        .await
        .unwrap();

    let handler = CleanupOldDataHandler::new(
        ctx.rows.clone(),
        ctx.runs.clone(),
        ctx.scheduler.clone(),
        &ScheduleSettings::default(),
    );
    let job = Job::from_payload(&CleanupOldDataPayload { days_old: 30 }).unwrap();
    handler.handle(&job).await.unwrap();

    let rows = ctx.rows.list_by_target(target.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].hash_key, "h-new");
    assert_eq!(queued_of(&ctx, JobType::CleanupOldData).await.len(), 1);

    for days_old in [-1, 1_000_000_000, i64::MAX] {
        let invalid = Job::from_payload(&CleanupOldDataPayload { days_old }).unwrap();
        assert!(matches!(
            handler.handle(&invalid).await.unwrap_err(),
            JobError::Permanent(_)
        ));
    }
    assert_eq!(ctx.rows.count_by_target(target.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_dedupe_keeps_earliest_row_per_hash() {
    let ctx = TestContext::new().await;
    // Rows that slipped past the unique index, as after a concurrent write race
    ctx.db
        .execute_unprepared("DROP INDEX uq_scraped_rows_hash_key")
        .await
        .unwrap();

    let target = ctx.add_target("Anadolu Sigorta iletişim", "https://example.com").await;
    let other = ctx.add_target("Allianz iletişim", "https://example.org").await;

    let earliest = row(target.id, "h-dup", "izmir", 3);
    for seeded in [
        row(target.id, "h-dup", "izmir", 1),
        earliest.clone(),
        row(target.id, "h-dup", "izmir", 2),
        row(target.id, "h-solo", "ankara", 1),
        row(other.id, "h-dup", "izmir", 1),
    ] {
        row_entity::ActiveModel::from(&seeded)
            .insert(ctx.db.as_ref())
            .await
            .unwrap();
    }

    assert_eq!(
        ctx.rows.find_duplicate_hashes(target.id).await.unwrap(),
        vec![DuplicateHash {
            hash_key: "h-dup".to_string(),
            count: 3
        }]
    );
    assert!(ctx.rows.find_duplicate_hashes(other.id).await.unwrap().is_empty());

    let handler = DedupeDataHandler::new(ctx.rows.clone());
    let job = Job::from_payload(&DedupeDataPayload { target_id: target.id }).unwrap();
    handler.handle(&job).await.unwrap();

    let survivors = ctx.rows.list_by_hash(target.id, "h-dup").await.unwrap();
    assert_eq!(survivors.len(), 1);
    assert_eq!(survivors[0].id, earliest.id);
    assert_eq!(ctx.rows.count_by_target(target.id).await.unwrap(), 2);
    assert_eq!(ctx.rows.count_by_target(other.id).await.unwrap(), 1);
    assert!(ctx.rows.find_duplicate_hashes(target.id).await.unwrap().is_empty());
}
