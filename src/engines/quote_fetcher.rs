// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperSettings;
use crate::domain::models::customer::CustomerProfile;
use crate::domain::models::scraped_quote::{OfferSource, QuoteOffer};
use crate::domain::models::target::ScraperTarget;
use crate::domain::services::pricing::{simulated_offer, PriceBreakdown};
use crate::engines::insurance_scraper::InsuranceScraper;
use crate::engines::traits::EngineError;
use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

/// 报价获取策略
///
/// 实时抓取与确定性模拟共享同一接口，由调用方按目标或按失败选择
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// 获取一家公司针对某个报价请求的报价
    async fn fetch(
        &self,
        target: &ScraperTarget,
        profile: &CustomerProfile,
        quote_id: Uuid,
    ) -> Result<QuoteOffer, EngineError>;

    fn name(&self) -> &'static str;
}

/// 确定性模拟报价：基础保费 × 公司系数，固定 10% 折扣
#[derive(Debug, Clone)]
pub struct SimulatedQuoteFetcher {
    settings: ScraperSettings,
    /// 整批报价都改用模拟时的原因（例如浏览器无法启动）
    fallback_reason: Option<String>,
}

impl SimulatedQuoteFetcher {
    pub fn new(settings: &ScraperSettings) -> Self {
        Self {
            settings: settings.clone(),
            fallback_reason: None,
        }
    }

    pub fn with_fallback_reason(mut self, reason: impl Into<String>) -> Self {
        self.fallback_reason = Some(reason.into());
        self
    }

    /// 生成模拟报价并记录来源
    pub fn offer(
        &self,
        target: &ScraperTarget,
        quote_id: Uuid,
        fallback_reason: Option<String>,
    ) -> QuoteOffer {
        let breakdown = PriceBreakdown::simulated(
            self.settings.base_premium,
            self.settings.multiplier_for(&target.name),
        );
        simulated_offer(
            quote_id,
            &target.name,
            breakdown,
            OfferSource::Simulated { fallback_reason },
            Utc::now(),
        )
    }
}

#[async_trait]
impl QuoteFetcher for SimulatedQuoteFetcher {
    async fn fetch(
        &self,
        target: &ScraperTarget,
        _profile: &CustomerProfile,
        quote_id: Uuid,
    ) -> Result<QuoteOffer, EngineError> {
        Ok(self.offer(target, quote_id, self.fallback_reason.clone()))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// 通过浏览器自动化实时抓取
pub struct LiveQuoteFetcher<'a> {
    scraper: &'a InsuranceScraper,
}

impl<'a> LiveQuoteFetcher<'a> {
    pub fn new(scraper: &'a InsuranceScraper) -> Self {
        Self { scraper }
    }
}

#[async_trait]
impl QuoteFetcher for LiveQuoteFetcher<'_> {
    async fn fetch(
        &self,
        target: &ScraperTarget,
        profile: &CustomerProfile,
        _quote_id: Uuid,
    ) -> Result<QuoteOffer, EngineError> {
        self.scraper.scrape_quote(target, profile).await
    }

    fn name(&self) -> &'static str {
        "live"
    }
}

/// 主策略失败时回退到模拟报价
///
/// 回退报价的原始负载带有 `fallback_reason`，供排查被掩盖的站点变化
pub struct FallbackQuoteFetcher<P> {
    primary: P,
    simulated: SimulatedQuoteFetcher,
}

impl<P: QuoteFetcher> FallbackQuoteFetcher<P> {
    pub fn new(primary: P, simulated: SimulatedQuoteFetcher) -> Self {
        Self { primary, simulated }
    }
}

#[async_trait]
impl<P: QuoteFetcher> QuoteFetcher for FallbackQuoteFetcher<P> {
    async fn fetch(
        &self,
        target: &ScraperTarget,
        profile: &CustomerProfile,
        quote_id: Uuid,
    ) -> Result<QuoteOffer, EngineError> {
        match self.primary.fetch(target, profile, quote_id).await {
            Ok(offer) => Ok(offer),
            Err(e) => {
                warn!(
                    company = %target.name,
                    strategy = self.primary.name(),
                    "Quote fetch failed, substituting simulated offer: {}",
                    e
                );
                Ok(self.simulated.offer(target, quote_id, Some(e.to_string())))
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
