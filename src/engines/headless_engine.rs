// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::domain::models::scrape_run::ScrapeStats;
use crate::domain::models::target::ScraperTarget;
use crate::domain::repositories::scraped_row_repository::ScrapedRowRepository;
use crate::engines::browser::BrowserSession;
use crate::engines::static_collector::{build_row, persist_row};
use crate::engines::stealth::{apply_stealth, humanize};
use crate::engines::traits::{EngineError, ScrapeFailure, TargetScraper};
use async_trait::async_trait;
use chromiumoxide::Page;
use metrics::counter;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// 页面内提取脚本：每个字段按候选选择器顺序取第一个匹配
pub const EXTRACT_PAGE_JS: &str = r#"
(() => {
    const data = {};
    const text = (selector) => {
        const el = document.querySelector(selector);
        if (!el) return null;
        const value = el.textContent.trim() || el.getAttribute('href') || '';
        return value.length > 0 ? value : null;
    };
    const fields = {
        title: 'h1, h2, .title, .product-title',
        description: '.description, .content, p',
        price: '.price, .premium, .cost, [class*="price"]',
        phone: '.phone, .tel, [href^="tel:"]',
        email: '.email, .mail, [href^="mailto:"]',
        address: '.address, .location, .contact-address',
    };
    for (const [field, selector] of Object.entries(fields)) {
        const value = text(selector);
        if (value !== null) data[field] = value;
    }
    data.links = Array.from(document.querySelectorAll('a[href]')).map(a => ({
        text: a.textContent.trim(),
        href: a.href,
    }));
    data.images = Array.from(document.querySelectorAll('img[src]')).map(img => ({
        alt: img.alt,
        src: img.src,
    }));
    return data;
})()
"#;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageLink {
    #[serde(default)]
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageImage {
    #[serde(default)]
    pub alt: String,
    pub src: String,
}

/// 提取脚本的返回值
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub links: Vec<PageLink>,
    #[serde(default)]
    pub images: Vec<PageImage>,
}

impl PageData {
    /// 可持久化的标量字段
    pub fn scalar_fields(&self) -> BTreeMap<String, String> {
        [
            ("title", &self.title),
            ("description", &self.description),
            ("price", &self.price),
            ("phone", &self.phone),
            ("email", &self.email),
            ("address", &self.address),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_ref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (name.to_string(), v.trim().to_string()))
        })
        .collect()
    }
}

/// 无头浏览器引擎
///
/// 独占一个浏览器会话，每个目标只尝试一个页面
pub struct HeadlessEngine {
    session: BrowserSession,
    rows: Arc<dyn ScrapedRowRepository>,
    page_timeout: Duration,
}

impl HeadlessEngine {
    pub async fn launch(
        settings: &ScraperSettings,
        rows: Arc<dyn ScrapedRowRepository>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            session: BrowserSession::launch(settings).await?,
            rows,
            page_timeout: settings.page_timeout(),
        })
    }

    /// 释放浏览器会话
    pub async fn close(self) {
        self.session.close().await;
    }

    async fn load_and_extract(&self, page: &Page, url: &str) -> Result<PageData, EngineError> {
        tokio::time::timeout(self.page_timeout, page.goto(url))
            .await
            .map_err(|_| EngineError::Timeout)??;

        if let Err(e) = apply_stealth(page).await {
            warn!("Failed to apply stealth: {}", e);
        }
        if let Err(e) = humanize(page).await {
            warn!("Failed to humanize page: {}", e);
        }

        let result = tokio::time::timeout(self.page_timeout, page.evaluate(EXTRACT_PAGE_JS))
            .await
            .map_err(|_| EngineError::Timeout)?
            .map_err(|e| EngineError::Extraction(format!("script execution failed: {}", e)))?;

        result
            .into_value::<PageData>()
            .map_err(|e| EngineError::Extraction(format!("unexpected script result: {}", e)))
    }
}

#[async_trait]
impl TargetScraper for HeadlessEngine {
    #[instrument(skip(self, target), fields(target_id = %target.id, target = %target.name))]
    async fn scrape_target(&self, target: &ScraperTarget) -> Result<ScrapeStats, ScrapeFailure> {
        let start = Instant::now();
        let mut stats = ScrapeStats {
            total_pages: 1,
            ..Default::default()
        };

        let page = self.session.new_page().await?;
        let extracted = self.load_and_extract(&page, &target.base_url).await;
        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        let data = match extracted {
            Ok(data) => data,
            Err(error) => {
                counter!("scrape_pages_total", "outcome" => "error").increment(1);
                stats.error_pages = 1;
                stats.duration_ms = start.elapsed().as_millis() as u64;
                return Err(ScrapeFailure { stats, error });
            }
        };

        counter!("scrape_pages_total", "outcome" => "success").increment(1);
        stats.success_pages = 1;

        let fields = data.scalar_fields();
        debug!(
            fields = fields.len(),
            links = data.links.len(),
            images = data.images.len(),
            "Page data extracted"
        );
        if !fields.is_empty() {
            let row = build_row(target, &target.base_url, "headless", &fields);
            match persist_row(self.rows.as_ref(), &row).await {
                Ok(true) => stats.data_extracted = 1,
                Ok(false) => {}
                Err(error) => {
                    stats.duration_ms = start.elapsed().as_millis() as u64;
                    return Err(ScrapeFailure { stats, error });
                }
            }
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(extracted = stats.data_extracted, "Headless scrape finished");
        Ok(stats)
    }

    fn name(&self) -> &'static str {
        "headless"
    }
}
