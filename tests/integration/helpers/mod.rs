// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use migration::{Migrator, MigratorTrait};
use quotrs::config::settings::{DatabaseSettings, LaneWeights, ScraperSettings};
use quotrs::domain::models::customer::Customer;
use quotrs::domain::models::target::ScraperTarget;
use quotrs::domain::repositories::customer_repository::CustomerRepository;
use quotrs::domain::repositories::policy_repository::PolicyRepository;
use quotrs::domain::repositories::quote_repository::QuoteRepository;
use quotrs::domain::repositories::scrape_run_repository::ScrapeRunRepository;
use quotrs::domain::repositories::scraped_row_repository::ScrapedRowRepository;
use quotrs::domain::repositories::target_repository::TargetRepository;
use quotrs::infrastructure::database::connection::create_pool;
use quotrs::infrastructure::repositories::customer_repo_impl::CustomerRepositoryImpl;
use quotrs::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use quotrs::infrastructure::repositories::policy_repo_impl::PolicyRepositoryImpl;
use quotrs::infrastructure::repositories::quote_repo_impl::QuoteRepositoryImpl;
use quotrs::infrastructure::repositories::scrape_run_repo_impl::ScrapeRunRepositoryImpl;
use quotrs::infrastructure::repositories::scraped_row_repo_impl::ScrapedRowRepositoryImpl;
use quotrs::infrastructure::repositories::target_repo_impl::TargetRepositoryImpl;
use quotrs::queue::job_queue::{DatabaseJobQueue, JobQueue};
use quotrs::queue::scheduler::JobScheduler;
use quotrs::utils::retry_policy::RetryPolicy;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// 单连接的内存数据库，已执行全部迁移
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: None,
        min_connections: None,
        connect_timeout: Some(5),
        idle_timeout: None,
    };
    let db = create_pool(&settings).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    Arc::new(db)
}

pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub jobs: Arc<JobRepositoryImpl>,
    pub queue: Arc<dyn JobQueue>,
    pub scheduler: JobScheduler,
    pub targets: Arc<dyn TargetRepository>,
    pub runs: Arc<dyn ScrapeRunRepository>,
    pub rows: Arc<dyn ScrapedRowRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub quotes: Arc<dyn QuoteRepository>,
    pub policies: Arc<dyn PolicyRepository>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_max_attempts(3).await
    }

    pub async fn with_max_attempts(max_attempts: u32) -> Self {
        let db = setup_db().await;
        let jobs = Arc::new(JobRepositoryImpl::new(db.clone()));
        let queue: Arc<dyn JobQueue> =
            Arc::new(DatabaseJobQueue::new(jobs.clone(), LaneWeights::default()));
        let scheduler = JobScheduler::new(queue.clone(), RetryPolicy::with_max_attempts(max_attempts));

        Self {
            jobs,
            queue,
            scheduler,
            targets: Arc::new(TargetRepositoryImpl::new(db.clone())),
            runs: Arc::new(ScrapeRunRepositoryImpl::new(db.clone())),
            rows: Arc::new(ScrapedRowRepositoryImpl::new(db.clone())),
            customers: Arc::new(CustomerRepositoryImpl::new(db.clone())),
            quotes: Arc::new(QuoteRepositoryImpl::new(db.clone())),
            policies: Arc::new(PolicyRepositoryImpl::new(db.clone())),
            db,
        }
    }

    pub async fn add_target(&self, name: &str, base_url: &str) -> ScraperTarget {
        self.targets
            .create(&ScraperTarget::new(name, base_url))
            .await
            .unwrap()
    }

    pub async fn add_customer(&self) -> Customer {
        let mut customer = Customer::new("10000000146", "Ayşe Yılmaz");
        customer.email = Some("ayse@example.com".to_string());
        customer.phone = Some("0532 123 45 67".to_string());
        customer.city = Some("istanbul".to_string());
        self.customers.create(&customer).await.unwrap()
    }
}

/// 测试用抓取配置：不等待、不访问 robots.txt、不启动浏览器
pub fn fast_scraper_settings() -> ScraperSettings {
    ScraperSettings {
        default_delay_ms: 0,
        respect_robots: false,
        headless_enabled: false,
        page_timeout_secs: 5,
        delay_between_targets_ms: 0,
        ..Default::default()
    }
}

/// 五家默认保险公司
pub const COMPANIES: [&str; 5] = [
    "Anadolu Sigorta",
    "Allianz",
    "Mapfre",
    "Aksigorta",
    "Axa Sigorta",
];
