// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::normalization::round2;
use crate::domain::models::scraped_quote::{OfferSource, QuoteOffer};
use chrono::{DateTime, Datelike, Duration, Utc};
use uuid::Uuid;

/// 模拟报价的固定折扣率
pub const SIMULATED_DISCOUNT_RATE: f64 = 0.10;
/// 代理佣金率
pub const AGENT_COMMISSION_RATE: f64 = 0.12;
/// 模拟报价的保额
pub const SIMULATED_COVERAGE: f64 = 50_000.0;

const SIMULATED_PRODUCT: &str = "Kasko Sigortası";
const SIMULATED_FEATURES: [&str; 4] = ["Tam Kasko", "Çekici Hizmeti", "Yedek Araç", "Cam Kırığı"];
const SIMULATED_EXCLUSIONS: [&str; 3] = ["Savaş", "Terör", "Nükleer"];

/// 由保费与折扣得到的派生价格
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBreakdown {
    pub premium: f64,
    pub discount: f64,
    pub final_price: f64,
    pub agent_commission: f64,
}

impl PriceBreakdown {
    /// 最终价格 = 保费 − 折扣，佣金为最终价格的 12%
    pub fn from_premium(premium: f64, discount: f64) -> Self {
        let premium = round2(premium);
        let discount = round2(discount);
        let final_price = round2(premium - discount);
        Self {
            premium,
            discount,
            final_price,
            agent_commission: round2(final_price * AGENT_COMMISSION_RATE),
        }
    }

    /// 模拟报价：基础保费乘以公司系数，固定 10% 折扣
    pub fn simulated(base_premium: f64, multiplier: f64) -> Self {
        let premium = round2(base_premium * multiplier);
        Self::from_premium(premium, premium * SIMULATED_DISCOUNT_RATE)
    }
}

/// 生成确定性的模拟报价
///
/// # 参数
///
/// * `quote_id` - 报价请求ID，写入模拟保单号
/// * `company` - 公司名称
/// * `breakdown` - 价格明细
/// * `source` - 来源（直接模拟或回退）
/// * `now` - 报价时间
pub fn simulated_offer(
    quote_id: Uuid,
    company: &str,
    breakdown: PriceBreakdown,
    source: OfferSource,
    now: DateTime<Utc>,
) -> QuoteOffer {
    let prefix: String = company.chars().take(3).collect();
    let valid_until = now
        .date_naive()
        .with_year(now.year() + 1)
        .unwrap_or_else(|| now.date_naive() + Duration::days(365));

    QuoteOffer {
        company_name: company.to_string(),
        product_name: Some(SIMULATED_PRODUCT.to_string()),
        premium: breakdown.premium,
        coverage_amount: SIMULATED_COVERAGE,
        discount: breakdown.discount,
        final_price: breakdown.final_price,
        currency: "TRY".to_string(),
        valid_until: Some(valid_until.format("%Y-%m-%d").to_string()),
        policy_number: Some(format!("POL-{}-{}", quote_id, prefix)),
        agent_commission: breakdown.agent_commission,
        features: SIMULATED_FEATURES.iter().map(|s| s.to_string()).collect(),
        exclusions: SIMULATED_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        source,
        scraped_at: now,
    }
}
