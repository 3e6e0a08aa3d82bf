// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::domain::models::customer::CustomerProfile;
use crate::domain::models::scraped_quote::{OfferSource, QuoteOffer};
use crate::domain::models::target::ScraperTarget;
use crate::domain::services::normalization::parse_amount;
use crate::domain::services::pricing::PriceBreakdown;
use crate::engines::browser::BrowserSession;
use crate::engines::field_registry::{FieldRegistry, FORM_FIELDS};
use crate::engines::stealth::{apply_stealth, humanize, random_delay};
use crate::engines::traits::EngineError;
use chrono::Utc;
use chromiumoxide::Page;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// 提交按钮候选选择器，按顺序尝试
pub const SUBMIT_SELECTORS: [&str; 6] = [
    "button[type='submit']",
    "input[type='submit']",
    ".submit-btn",
    ".quote-submit",
    "#submit",
    ".btn-submit",
];

/// 最多保留的特性条目数
pub const MAX_FEATURES: usize = 10;

/// 结果页提取脚本
///
/// 金额字段返回各候选选择器首个匹配元素的文本，数值解析在 Rust 侧完成
pub const EXTRACT_QUOTE_JS: &str = r#"
(() => {
    const texts = (selectors) => selectors
        .map(s => document.querySelector(s))
        .filter(el => el !== null)
        .map(el => el.textContent.trim())
        .filter(t => t.length > 0);
    const data = {
        premium: texts(['.premium', '.price', '.cost', '.amount',
            '[class*="premium"]', '[class*="price"]', '[class*="cost"]',
            '.quote-price', '.insurance-price', '.total-price']),
        coverage: texts(['.coverage', '.sum-insured', '.limit', '.amount-covered',
            '[class*="coverage"]', '[class*="limit"]']),
        discount: texts(['.discount', '.saving', '.reduction', '.off',
            '[class*="discount"]', '[class*="saving"]']),
        policy_number: texts(['.policy-number', '.policy-no', '.quote-number', '.quote-no',
            '[class*="policy"]', '[class*="quote"]']).find(t => t.length > 5) || null,
        valid_until: texts(['.valid-until', '.expiry', '.expires', '.validity',
            '[class*="valid"]', '[class*="expiry"]'])
            .find(t => /\d{1,2}[./]\d{1,2}[./]\d{2,4}/.test(t)) || null,
        features: [],
    };
    document.querySelectorAll('.feature, .benefit, .coverage-item, li').forEach(el => {
        const t = el.textContent.trim();
        if (t.length > 10 && t.length < 100) data.features.push(t);
    });
    return data;
})()
"#;

/// 结果页提取脚本的返回值
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedQuote {
    #[serde(default)]
    pub premium: Vec<String>,
    #[serde(default)]
    pub coverage: Vec<String>,
    #[serde(default)]
    pub discount: Vec<String>,
    pub policy_number: Option<String>,
    pub valid_until: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// 候选文本中第一个可解析的正数金额
fn first_amount(candidates: &[String]) -> Option<f64> {
    candidates
        .iter()
        .filter_map(|text| parse_amount(text))
        .find(|amount| *amount > 0.0)
}

impl ExtractedQuote {
    /// 转换为报价，找不到保费时返回提取错误
    pub fn into_offer(self, company: &str) -> Result<QuoteOffer, EngineError> {
        let premium = first_amount(&self.premium).ok_or_else(|| {
            EngineError::Extraction("premium not found on results page".to_string())
        })?;
        let discount = first_amount(&self.discount).unwrap_or(0.0);
        let breakdown = PriceBreakdown::from_premium(premium, discount);

        Ok(QuoteOffer {
            company_name: company.to_string(),
            product_name: None,
            premium: breakdown.premium,
            coverage_amount: first_amount(&self.coverage).unwrap_or(0.0),
            discount: breakdown.discount,
            final_price: breakdown.final_price,
            currency: "TRY".to_string(),
            valid_until: self.valid_until,
            policy_number: self.policy_number,
            agent_commission: breakdown.agent_commission,
            features: self.features.into_iter().take(MAX_FEATURES).collect(),
            exclusions: Vec::new(),
            source: OfferSource::Live,
            scraped_at: Utc::now(),
        })
    }
}

/// 保险报价抓取器
///
/// 在无头浏览器中打开保险公司页面，按公司字段表逐字填写客户资料，
/// 提交表单后从结果页提取报价
pub struct InsuranceScraper {
    session: BrowserSession,
    registry: Arc<FieldRegistry>,
    page_timeout: Duration,
}

impl InsuranceScraper {
    pub async fn launch(
        settings: &ScraperSettings,
        registry: Arc<FieldRegistry>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            session: BrowserSession::launch(settings).await?,
            registry,
            page_timeout: settings.page_timeout(),
        })
    }

    /// 释放浏览器会话
    pub async fn close(self) {
        self.session.close().await;
    }

    /// 抓取一家公司的实时报价
    #[instrument(skip(self, target, profile), fields(company = %target.name))]
    pub async fn scrape_quote(
        &self,
        target: &ScraperTarget,
        profile: &CustomerProfile,
    ) -> Result<QuoteOffer, EngineError> {
        let page = self.session.new_page().await?;
        let result = self.drive(&page, target, profile).await;
        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }
        result
    }

    async fn drive(
        &self,
        page: &Page,
        target: &ScraperTarget,
        profile: &CustomerProfile,
    ) -> Result<QuoteOffer, EngineError> {
        tokio::time::timeout(self.page_timeout, page.goto(target.base_url.as_str()))
            .await
            .map_err(|_| EngineError::Timeout)??;

        if let Err(e) = apply_stealth(page).await {
            warn!("Failed to apply stealth: {}", e);
        }
        if let Err(e) = humanize(page).await {
            warn!("Failed to humanize page: {}", e);
        }

        self.fill_form(page, target, profile).await?;
        self.submit(page).await?;

        let result = tokio::time::timeout(self.page_timeout, page.evaluate(EXTRACT_QUOTE_JS))
            .await
            .map_err(|_| EngineError::Timeout)?
            .map_err(|e| EngineError::Extraction(format!("script execution failed: {}", e)))?;
        let extracted = result
            .into_value::<ExtractedQuote>()
            .map_err(|e| EngineError::Extraction(format!("unexpected script result: {}", e)))?;

        let offer = extracted.into_offer(&target.name)?;
        info!(final_price = offer.final_price, "Live quote extracted");
        Ok(offer)
    }

    /// 填写表单，单个字段失败只记录日志；一个字段都没填上时视为表单自动化失败
    async fn fill_form(
        &self,
        page: &Page,
        target: &ScraperTarget,
        profile: &CustomerProfile,
    ) -> Result<(), EngineError> {
        if !self.registry.is_known(&target.name) {
            debug!("No field map for company, using default selectors");
        }
        let selectors = self.registry.selectors_for(&target.name);
        let mut filled = 0usize;

        for field in FORM_FIELDS {
            let (Some(selector), Some(value)) = (selectors.get(field), profile.field(field)) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            match fill_field(page, selector, &value).await {
                Ok(()) => filled += 1,
                Err(e) => warn!(field, "Failed to fill field: {}", e),
            }
        }

        sleep(random_delay(500, 1500)).await;

        if filled == 0 {
            return Err(EngineError::FormAutomation(
                "no form field could be filled".to_string(),
            ));
        }
        debug!(filled, "Form filled");
        Ok(())
    }

    async fn submit(&self, page: &Page) -> Result<(), EngineError> {
        let mut button = None;
        for selector in SUBMIT_SELECTORS {
            if let Ok(element) = page.find_element(selector).await {
                button = Some(element);
                break;
            }
        }
        let button = button
            .ok_or_else(|| EngineError::FormAutomation("submit button not found".to_string()))?;
        button.click().await?;

        sleep(Duration::from_secs(3)).await;
        // A missing navigation is not an error: results may render in place
        if tokio::time::timeout(self.page_timeout, page.wait_for_navigation())
            .await
            .is_err()
        {
            debug!("No navigation after submit");
        }
        Ok(())
    }
}

/// 清空字段后逐字输入，每个字符之间随机停顿 50~150ms
async fn fill_field(page: &Page, selector: &str, value: &str) -> Result<(), EngineError> {
    let element = page
        .find_element(selector)
        .await
        .map_err(|_| EngineError::FormAutomation(format!("element not found: {}", selector)))?;

    element
        .call_js_fn("function() { this.value = ''; }", false)
        .await?;
    element.click().await?;

    for ch in value.chars() {
        element.type_str(ch.to_string()).await?;
        sleep(random_delay(50, 150)).await;
    }
    Ok(())
}
