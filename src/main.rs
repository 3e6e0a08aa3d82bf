// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use migration::{Migrator, MigratorTrait};
use quotrs::application::use_cases::quote_workflow::QuoteWorkflow;
use quotrs::application::use_cases::scrape_use_case::ScrapeUseCase;
use quotrs::config::settings::Settings;
use quotrs::domain::repositories::customer_repository::CustomerRepository;
use quotrs::domain::repositories::quote_repository::QuoteRepository;
use quotrs::domain::repositories::scrape_run_repository::ScrapeRunRepository;
use quotrs::domain::repositories::scraped_row_repository::ScrapedRowRepository;
use quotrs::domain::repositories::target_repository::TargetRepository;
use quotrs::engines::field_registry::FieldRegistry;
use quotrs::engines::static_collector::StaticCollector;
use quotrs::infrastructure::database::connection;
use quotrs::infrastructure::repositories::customer_repo_impl::CustomerRepositoryImpl;
use quotrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use quotrs::infrastructure::repositories::quote_repo_impl::QuoteRepositoryImpl;
use quotrs::infrastructure::repositories::scrape_run_repo_impl::ScrapeRunRepositoryImpl;
use quotrs::infrastructure::repositories::scraped_row_repo_impl::ScrapedRowRepositoryImpl;
use quotrs::infrastructure::repositories::target_repo_impl::TargetRepositoryImpl;
use quotrs::presentation::routes;
use quotrs::queue::job_queue::{DatabaseJobQueue, JobQueue};
use quotrs::queue::scheduler::JobScheduler;
use quotrs::utils::retry_policy::RetryPolicy;
use quotrs::utils::telemetry;
use quotrs::workers::handlers::{
    CleanupOldDataHandler, DedupeDataHandler, EnrichDataHandler, QuoteScrapeHandler,
    ScrapeAllHandler, ScrapeTargetHandler,
};
use quotrs::workers::{HandlerRegistry, WorkerManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting quotrs...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    quotrs::infrastructure::metrics::init_metrics(&settings.metrics.listen_addr);

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Repositories and queue
    let targets: Arc<dyn TargetRepository> = Arc::new(TargetRepositoryImpl::new(db.clone()));
    let runs: Arc<dyn ScrapeRunRepository> = Arc::new(ScrapeRunRepositoryImpl::new(db.clone()));
    let rows: Arc<dyn ScrapedRowRepository> = Arc::new(ScrapedRowRepositoryImpl::new(db.clone()));
    let customers: Arc<dyn CustomerRepository> = Arc::new(CustomerRepositoryImpl::new(db.clone()));
    let quotes: Arc<dyn QuoteRepository> = Arc::new(QuoteRepositoryImpl::new(db.clone()));

    let job_repo = Arc::new(JobRepositoryImpl::new(db.clone()));
    let queue: Arc<dyn JobQueue> = Arc::new(DatabaseJobQueue::new(job_repo, settings.queue.weights));
    let scheduler = JobScheduler::new(
        queue,
        RetryPolicy::with_max_attempts(settings.scraper.max_retry),
    );

    if settings.schedule.enabled {
        scheduler.schedule_periodic_jobs(&settings.schedule).await?;
    }
    let stuck_timeout = settings
        .queue
        .stuck_job_timeout()
        .ok_or_else(|| anyhow::anyhow!("queue.stuck_job_timeout_secs is out of range"))?;
    let maintenance = scheduler.start(stuck_timeout);

    // 5. Use cases
    let workflow = Arc::new(QuoteWorkflow::new(
        customers,
        quotes,
        targets.clone(),
        scheduler.clone(),
        Duration::from_millis(settings.scraper.delay_between_targets_ms),
    ));
    let scrape = Arc::new(ScrapeUseCase::new(targets.clone(), scheduler.clone()));

    // 6. Start workers
    let collector = Arc::new(StaticCollector::new(&settings.scraper, rows.clone())?);
    let registry = HandlerRegistry::new()
        .register(Arc::new(ScrapeTargetHandler::new(
            targets.clone(),
            runs.clone(),
            rows.clone(),
            collector,
            scheduler.clone(),
            settings.scraper.clone(),
        )))
        .register(Arc::new(ScrapeAllHandler::new(
            targets,
            scheduler.clone(),
            &settings.schedule,
        )))
        .register(Arc::new(EnrichDataHandler::new(rows.clone())))
        .register(Arc::new(DedupeDataHandler::new(rows.clone())))
        .register(Arc::new(CleanupOldDataHandler::new(
            rows,
            runs,
            scheduler.clone(),
            &settings.schedule,
        )))
        .register(Arc::new(QuoteScrapeHandler::new(
            workflow.clone(),
            Arc::new(FieldRegistry::builtin()),
            settings.scraper.clone(),
        )));

    let mut worker_manager = WorkerManager::new(
        scheduler,
        registry,
        Duration::from_millis(settings.queue.poll_interval_ms),
    );
    worker_manager.start_workers(settings.queue.concurrency);

    // 7. Start HTTP server
    let app = routes::routes(workflow, scrape);
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    maintenance.abort();
    worker_manager.shutdown().await;
    info!("quotrs stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}
