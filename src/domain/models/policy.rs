// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::quote::Quote;
use super::scraped_quote::ScrapedQuote;

/// 保单
///
/// 由一条被批准的报价生成，保留报价请求与报价记录的引用以便追溯
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub quote_id: Uuid,
    pub scraped_quote_id: Uuid,
    /// 唯一保单号，格式 `POL-{YYYY}-{8位十六进制}`
    pub policy_number: String,
    pub company_name: String,
    pub premium: f64,
    pub status: PolicyStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    #[default]
    Active,
    Expired,
    Cancelled,
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PolicyStatus::Active => write!(f, "active"),
            PolicyStatus::Expired => write!(f, "expired"),
            PolicyStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for PolicyStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PolicyStatus::Active),
            "expired" => Ok(PolicyStatus::Expired),
            "cancelled" => Ok(PolicyStatus::Cancelled),
            _ => Err(()),
        }
    }
}

/// 生成保单号
pub fn generate_policy_number(now: DateTime<Utc>) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("POL-{}-{}", now.year(), simple[..8].to_uppercase())
}

impl Policy {
    /// 从报价请求与选中的报价生成保单，保费取报价的最终价格
    pub fn issue(quote: &Quote, offer: &ScrapedQuote) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id: quote.customer_id,
            product_id: quote.product_id,
            agent_id: quote.agent_id,
            quote_id: quote.id,
            scraped_quote_id: offer.id,
            policy_number: generate_policy_number(now),
            company_name: offer.company_name.clone(),
            premium: offer.final_price,
            status: PolicyStatus::Active,
            start_date: quote.start_date,
            end_date: quote.end_date,
            created_at: now.fixed_offset(),
            updated_at: now.fixed_offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;

    #[test]
    fn test_policy_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let number = generate_policy_number(now);
        let pattern = Regex::new(r"^POL-2026-[0-9A-F]{8}$").unwrap();
        assert!(pattern.is_match(&number), "{}", number);
    }

    #[test]
    fn test_issue_copies_final_price_and_company() {
        let mut quote = Quote::new(Uuid::new_v4());
        quote.start_date = NaiveDate::from_ymd_opt(2026, 1, 1);
        quote.end_date = NaiveDate::from_ymd_opt(2027, 1, 1);
        let offer = ScrapedQuote::failed(quote.id, "Allianz".into(), None, String::new());
        let offer = ScrapedQuote {
            premium: 1425.0,
            final_price: 1282.5,
            ..offer
        };

        let policy = Policy::issue(&quote, &offer);
        assert_eq!(policy.premium, 1282.5);
        assert_eq!(policy.company_name, "Allianz");
        assert_eq!(policy.status, PolicyStatus::Active);
        assert_eq!(policy.scraped_quote_id, offer.id);
        assert_eq!(policy.start_date, quote.start_date);
    }
}
