// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 报价请求
///
/// 客户对比较报价的请求。状态只能单向前进：
/// Pending → Processing → Completed → Approved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub vehicle_plate: Option<String>,
    pub vehicle_year: Option<i32>,
    pub vehicle_brand: Option<String>,
    pub vehicle_model: Option<String>,
    pub coverage_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// 自由备注
    pub additional_info: Option<serde_json::Value>,
    pub status: QuoteStatus,
    pub valid_until: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// 报价状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    /// 已创建，等待抓取作业
    #[default]
    Pending,
    /// 抓取作业已认领
    Processing,
    /// 所有目标都已尝试
    Completed,
    /// 已选定报价并出单（终态）
    Approved,
}

impl QuoteStatus {
    /// 判断状态迁移是否合法，只允许向后一个状态前进
    pub fn can_transition_to(&self, next: QuoteStatus) -> bool {
        matches!(
            (self, next),
            (QuoteStatus::Pending, QuoteStatus::Processing)
                | (QuoteStatus::Processing, QuoteStatus::Completed)
                | (QuoteStatus::Completed, QuoteStatus::Approved)
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == QuoteStatus::Approved
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QuoteStatus::Pending => write!(f, "pending"),
            QuoteStatus::Processing => write!(f, "processing"),
            QuoteStatus::Completed => write!(f, "completed"),
            QuoteStatus::Approved => write!(f, "approved"),
        }
    }
}

impl FromStr for QuoteStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QuoteStatus::Pending),
            "processing" => Ok(QuoteStatus::Processing),
            "completed" => Ok(QuoteStatus::Completed),
            "approved" => Ok(QuoteStatus::Approved),
            _ => Err(()),
        }
    }
}

/// 非法状态迁移
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid quote transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: QuoteStatus,
    pub to: QuoteStatus,
}

impl Quote {
    pub fn new(customer_id: Uuid) -> Self {
        let now = Utc::now().fixed_offset();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            product_id: None,
            agent_id: None,
            vehicle_plate: None,
            vehicle_year: None,
            vehicle_brand: None,
            vehicle_model: None,
            coverage_type: None,
            start_date: None,
            end_date: None,
            additional_info: None,
            status: QuoteStatus::Pending,
            valid_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 执行状态迁移
    pub fn transition_to(&mut self, next: QuoteStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now().fixed_offset();
        Ok(())
    }
}
