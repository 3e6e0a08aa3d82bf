// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::Job;
use crate::domain::models::policy::Policy;
use crate::domain::models::quote::Quote;
use crate::domain::models::scraped_quote::ScrapedQuote;
use crate::domain::models::target::ScraperTarget;
use crate::domain::services::normalization::format_price;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

/// 报价请求响应
#[derive(Debug, Serialize)]
pub struct QuoteResponseDto {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<&Quote> for QuoteResponseDto {
    fn from(quote: &Quote) -> Self {
        Self {
            id: quote.id,
            customer_id: quote.customer_id,
            status: quote.status.to_string(),
            created_at: quote.created_at,
        }
    }
}

/// 单条公司报价
#[derive(Debug, Serialize)]
pub struct OfferResponseDto {
    pub id: Uuid,
    pub company_name: String,
    pub company_logo: Option<String>,
    pub premium: f64,
    pub discount: Option<f64>,
    pub final_price: f64,
    /// 展示用价格，例如 `1282.50 TL`
    pub display_price: String,
    pub status: String,
    /// `live` / `simulated`，失败记录为空
    pub source: Option<String>,
    pub error_message: Option<String>,
    pub valid_until: Option<NaiveDate>,
}

impl From<&ScrapedQuote> for OfferResponseDto {
    fn from(offer: &ScrapedQuote) -> Self {
        Self {
            id: offer.id,
            company_name: offer.company_name.clone(),
            company_logo: offer.company_logo.clone(),
            premium: offer.premium,
            discount: offer.discount,
            final_price: offer.final_price,
            display_price: format_price(offer.final_price),
            status: offer.status.to_string(),
            source: offer
                .raw_data
                .as_ref()
                .and_then(|raw| raw.get("source"))
                .and_then(|s| s.as_str())
                .map(str::to_string),
            error_message: offer.error_message.clone(),
            valid_until: offer.valid_until(),
        }
    }
}

/// 按最终价格升序的报价列表
#[derive(Debug, Serialize)]
pub struct OfferListResponseDto {
    pub quote_id: Uuid,
    pub status: String,
    pub offers: Vec<OfferResponseDto>,
}

/// 保单响应
#[derive(Debug, Serialize)]
pub struct PolicyResponseDto {
    pub id: Uuid,
    pub policy_number: String,
    pub company_name: String,
    pub premium: f64,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl From<&Policy> for PolicyResponseDto {
    fn from(policy: &Policy) -> Self {
        Self {
            id: policy.id,
            policy_number: policy.policy_number.clone(),
            company_name: policy.company_name.clone(),
            premium: policy.premium,
            status: policy.status.to_string(),
            start_date: policy.start_date,
            end_date: policy.end_date,
        }
    }
}

/// 抓取目标
#[derive(Debug, Serialize)]
pub struct TargetResponseDto {
    pub id: Uuid,
    pub name: String,
    pub base_url: String,
    pub logo_url: Option<String>,
    pub enabled: bool,
    pub is_active: bool,
    pub use_headless: bool,
}

impl From<&ScraperTarget> for TargetResponseDto {
    fn from(target: &ScraperTarget) -> Self {
        Self {
            id: target.id,
            name: target.name.clone(),
            base_url: target.base_url.clone(),
            logo_url: target.logo_url.clone(),
            enabled: target.enabled,
            is_active: target.is_active,
            use_headless: target.use_headless,
        }
    }
}

/// 已入队或死信作业
#[derive(Debug, Serialize)]
pub struct JobResponseDto {
    pub id: Uuid,
    pub job_type: String,
    pub queue: String,
    pub status: String,
    pub attempt_count: i32,
    pub max_attempts: i32,
    pub last_error: Option<String>,
    pub run_at: DateTime<FixedOffset>,
}

impl From<&Job> for JobResponseDto {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            job_type: job.job_type.to_string(),
            queue: job.queue.to_string(),
            status: job.status.to_string(),
            attempt_count: job.attempt_count,
            max_attempts: job.max_attempts,
            last_error: job.last_error.clone(),
            run_at: job.run_at,
        }
    }
}
