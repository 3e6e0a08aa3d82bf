// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// 创建报价请求数据传输对象
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_date_range"))]
pub struct CreateQuoteRequestDto {
    /// 客户ID
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    /// 车牌号
    #[validate(length(min = 2, max = 16))]
    pub vehicle_plate: Option<String>,
    #[validate(range(min = 1950, max = 2100))]
    pub vehicle_year: Option<i32>,
    #[validate(length(max = 64))]
    pub vehicle_brand: Option<String>,
    #[validate(length(max = 64))]
    pub vehicle_model: Option<String>,
    #[validate(length(max = 32))]
    pub coverage_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// 自由备注
    pub additional_info: Option<serde_json::Value>,
}

fn validate_date_range(dto: &CreateQuoteRequestDto) -> Result<(), ValidationError> {
    match (dto.start_date, dto.end_date) {
        (Some(start), Some(end)) if end <= start => Err(ValidationError::new("date_range")),
        _ => Ok(()),
    }
}

/// 全量抓取请求
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScrapeAllRequestDto {
    #[serde(default)]
    pub force: bool,
}

/// 死信作业查询参数
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DeadJobsQueryDto {
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u64>,
}
