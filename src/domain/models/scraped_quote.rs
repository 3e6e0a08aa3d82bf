// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 单家公司针对某个报价请求给出的报价
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedQuote {
    pub id: Uuid,
    pub quote_id: Uuid,
    pub company_name: String,
    pub company_logo: Option<String>,
    pub premium: f64,
    pub coverage_amount: Option<f64>,
    pub discount: Option<f64>,
    /// premium − discount
    pub final_price: f64,
    pub status: OfferStatus,
    pub error_message: Option<String>,
    /// 原始负载，包含来源信息
    pub raw_data: Option<serde_json::Value>,
    pub scraped_at: DateTime<FixedOffset>,
    pub created_at: DateTime<FixedOffset>,
}

/// 报价状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Scraped,
    Error,
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OfferStatus::Scraped => write!(f, "scraped"),
            OfferStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for OfferStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scraped" => Ok(OfferStatus::Scraped),
            "error" => Ok(OfferStatus::Error),
            _ => Err(()),
        }
    }
}

/// 报价来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OfferSource {
    /// 通过浏览器自动化实时获取
    Live,
    /// 确定性模拟数据
    Simulated {
        /// 回退原因，仅在实时路径失败时存在
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback_reason: Option<String>,
    },
}

impl OfferSource {
    pub fn label(&self) -> &'static str {
        match self {
            OfferSource::Live => "live",
            OfferSource::Simulated { .. } => "simulated",
        }
    }
}

/// 报价抓取结果（尚未持久化）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteOffer {
    pub company_name: String,
    pub product_name: Option<String>,
    pub premium: f64,
    pub coverage_amount: f64,
    pub discount: f64,
    pub final_price: f64,
    pub currency: String,
    pub valid_until: Option<String>,
    pub policy_number: Option<String>,
    pub agent_commission: f64,
    pub features: Vec<String>,
    pub exclusions: Vec<String>,
    #[serde(flatten)]
    pub source: OfferSource,
    pub scraped_at: DateTime<Utc>,
}

impl ScrapedQuote {
    /// 从抓取结果构建报价记录
    pub fn from_offer(quote_id: Uuid, logo: Option<String>, offer: &QuoteOffer) -> Self {
        let now = Utc::now().fixed_offset();
        Self {
            id: Uuid::new_v4(),
            quote_id,
            company_name: offer.company_name.clone(),
            company_logo: logo,
            premium: offer.premium,
            coverage_amount: Some(offer.coverage_amount),
            discount: Some(offer.discount),
            final_price: offer.final_price,
            status: OfferStatus::Scraped,
            error_message: None,
            raw_data: serde_json::to_value(offer).ok(),
            scraped_at: offer.scraped_at.fixed_offset(),
            created_at: now,
        }
    }

    /// 抓取失败时的占位记录，保证每个目标都有一条记录
    pub fn failed(quote_id: Uuid, company_name: String, logo: Option<String>, error: String) -> Self {
        let now = Utc::now().fixed_offset();
        Self {
            id: Uuid::new_v4(),
            quote_id,
            company_name,
            company_logo: logo,
            premium: 0.0,
            coverage_amount: None,
            discount: None,
            final_price: 0.0,
            status: OfferStatus::Error,
            error_message: Some(error),
            raw_data: None,
            scraped_at: now,
            created_at: now,
        }
    }

    /// 报价有效期截止日（若原始负载中可解析）
    pub fn valid_until(&self) -> Option<NaiveDate> {
        self.raw_data
            .as_ref()
            .and_then(|raw| raw.get("valid_until"))
            .and_then(|v| v.as_str())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }
}
