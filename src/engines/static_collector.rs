// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::domain::models::scrape_run::ScrapeStats;
use crate::domain::models::scraped_row::{FieldMap, InsertOutcome, ScrapedRow};
use crate::domain::models::target::ScraperTarget;
use crate::domain::repositories::scraped_row_repository::ScrapedRowRepository;
use crate::domain::services::extraction_service::{resolve_selectors, ExtractionService};
use crate::domain::services::normalization::{content_hash, normalize_fields};
use crate::engines::traits::{EngineError, ScrapeFailure, TargetScraper};
use crate::utils::robots::{RobotsChecker, RobotsPolicy};
use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::Client;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// 由一组提取结果构建抓取数据行
///
/// 原始字段参与哈希，规范化字段单独保存
pub fn build_row(
    target: &ScraperTarget,
    page_url: &str,
    row_type: &str,
    fields: &BTreeMap<String, String>,
) -> ScrapedRow {
    let raw: FieldMap = fields
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    let normalized = normalize_fields(fields);
    let hash_key = content_hash(&target.base_url, &raw);
    ScrapedRow::new(
        target.id,
        hash_key,
        page_url.to_string(),
        row_type.to_string(),
        raw,
        normalized,
    )
}

/// 写入一行，重复哈希视为成功的无操作
pub(crate) async fn persist_row(
    rows: &dyn ScrapedRowRepository,
    row: &ScrapedRow,
) -> Result<bool, EngineError> {
    match rows.insert_if_absent(row).await? {
        InsertOutcome::Inserted => {
            counter!("scraped_rows_inserted_total").increment(1);
            Ok(true)
        }
        InsertOutcome::Duplicate => {
            debug!(hash_key = %row.hash_key, "Row already stored");
            Ok(false)
        }
    }
}

/// 静态内容采集器
///
/// 只访问目标自身域名；同一域名同时只有一个请求，相邻请求之间保持固定间隔
pub struct StaticCollector {
    client: Client,
    rows: Arc<dyn ScrapedRowRepository>,
    robots: Option<Arc<dyn RobotsPolicy>>,
    user_agent: String,
    default_delay: Duration,
    max_pages: usize,
    /// 每个域名上一次请求完成的时间
    domains: DashMap<String, Arc<Mutex<Option<Instant>>>>,
}

impl StaticCollector {
    /// 创建采集器
    ///
    /// # 参数
    ///
    /// * `settings` - 抓取配置
    /// * `rows` - 抓取数据仓库
    pub fn new(
        settings: &ScraperSettings,
        rows: Arc<dyn ScrapedRowRepository>,
    ) -> Result<Self, EngineError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.page_timeout())
            .build()?;

        let robots: Option<Arc<dyn RobotsPolicy>> = if settings.respect_robots {
            Some(Arc::new(RobotsChecker::new(
                client.clone(),
                settings.user_agent.clone(),
            )))
        } else {
            None
        };

        Ok(Self {
            client,
            rows,
            robots,
            user_agent: settings.user_agent.clone(),
            default_delay: Duration::from_millis(settings.default_delay_ms),
            max_pages: settings.max_pages.max(1),
            domains: DashMap::new(),
        })
    }

    /// 替换 robots.txt 策略
    pub fn with_robots(mut self, robots: Option<Arc<dyn RobotsPolicy>>) -> Self {
        self.robots = robots;
        self
    }

    fn request_headers(target: &ScraperTarget) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (k, v) in target.headers() {
            if let (Ok(k), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(&v),
            ) {
                headers.insert(k, v);
            }
        }

        let cookies = target.cookies();
        if !cookies.is_empty() {
            let cookie = cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.insert(COOKIE, value);
            }
        }
        headers
    }

    fn domain_key(url: &Url) -> String {
        format!(
            "{}:{}",
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or(80)
        )
    }

    async fn politeness_delay(&self, url: &Url) -> Duration {
        let Some(robots) = &self.robots else {
            return self.default_delay;
        };
        match robots.crawl_delay(url, &self.user_agent).await {
            Ok(Some(delay)) => delay.max(self.default_delay),
            Ok(None) => self.default_delay,
            Err(e) => {
                debug!("Failed to read crawl delay: {}", e);
                self.default_delay
            }
        }
    }

    /// 按域名串行地获取页面
    async fn fetch_page(&self, url: &Url, headers: &HeaderMap) -> Result<String, EngineError> {
        let delay = self.politeness_delay(url).await;
        let gate = self
            .domains
            .entry(Self::domain_key(url))
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();

        // Held across the request: one request in flight per domain
        let mut last_request = gate.lock().await;
        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }

        let result = async {
            let response = self
                .client
                .get(url.as_str())
                .headers(headers.clone())
                .send()
                .await?
                .error_for_status()?;
            Ok::<_, EngineError>(response.text().await?)
        }
        .await;

        *last_request = Some(Instant::now());
        result
    }

    async fn is_allowed(&self, url: &Url) -> bool {
        let Some(robots) = &self.robots else {
            return true;
        };
        match robots.is_allowed(url, &self.user_agent).await {
            Ok(allowed) => allowed,
            Err(e) => {
                warn!("Robots check failed for {}: {}, proceeding", url, e);
                true
            }
        }
    }
}

#[async_trait]
impl TargetScraper for StaticCollector {
    #[instrument(skip(self, target), fields(target_id = %target.id, target = %target.name))]
    async fn scrape_target(&self, target: &ScraperTarget) -> Result<ScrapeStats, ScrapeFailure> {
        let start = Instant::now();
        let base = Url::parse(&target.base_url)
            .map_err(|e| EngineError::Other(format!("Invalid base url {}: {}", target.base_url, e)))?;
        let headers = Self::request_headers(target);
        let profile = resolve_selectors(target);
        debug!(profile = %profile.name, "Resolved selector profile");

        let mut stats = ScrapeStats::default();
        let mut last_error: Option<EngineError> = None;
        let mut queue = VecDeque::from([base.clone()]);
        let mut seen: HashSet<Url> = HashSet::from([base]);

        while let Some(url) = queue.pop_front() {
            if stats.total_pages as usize >= self.max_pages {
                break;
            }
            if !self.is_allowed(&url).await {
                info!("Skipping {} disallowed by robots.txt", url);
                last_error = Some(EngineError::Disallowed(url.to_string()));
                continue;
            }

            stats.total_pages += 1;
            let html = match self.fetch_page(&url, &headers).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    counter!("scrape_pages_total", "outcome" => "error").increment(1);
                    stats.error_pages += 1;
                    last_error = Some(e);
                    continue;
                }
            };

            let extraction = ExtractionService::extract(&html, &profile.selectors);
            if extraction.invalid_fields.is_empty() {
                counter!("scrape_pages_total", "outcome" => "success").increment(1);
                stats.success_pages += 1;
            } else {
                warn!(
                    "Invalid selectors on {} for fields {:?}",
                    url, extraction.invalid_fields
                );
                counter!("scrape_pages_total", "outcome" => "error").increment(1);
                stats.error_pages += 1;
                last_error = Some(EngineError::Extraction(format!(
                    "invalid selectors for {:?}",
                    extraction.invalid_fields
                )));
            }

            if !extraction.fields.is_empty() {
                let row = build_row(target, url.as_str(), &profile.name, &extraction.fields);
                match persist_row(self.rows.as_ref(), &row).await {
                    Ok(true) => stats.data_extracted += 1,
                    Ok(false) => {}
                    Err(error) => {
                        stats.duration_ms = start.elapsed().as_millis() as u64;
                        return Err(ScrapeFailure { stats, error });
                    }
                }
            }

            if self.max_pages > 1 {
                for link in ExtractionService::same_domain_links(&html, &url) {
                    if seen.insert(link.clone()) {
                        queue.push_back(link);
                    }
                }
            }
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;

        if stats.success_pages == 0 && stats.data_extracted == 0 {
            if let Some(error) = last_error {
                return Err(ScrapeFailure { stats, error });
            }
        }

        info!(
            total = stats.total_pages,
            success = stats.success_pages,
            errors = stats.error_pages,
            extracted = stats.data_extracted,
            "Static scrape finished"
        );
        Ok(stats)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
