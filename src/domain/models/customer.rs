// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::quote::Quote;
use crate::domain::services::normalization::validate_tckn;

/// 客户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    /// 土耳其身份证号（TCKN）
    pub national_id: String,
    /// 全名
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl Customer {
    pub fn new(national_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now().fixed_offset();
        Self {
            id: Uuid::new_v4(),
            national_id: national_id.into(),
            name: name.into(),
            email: None,
            phone: None,
            address: None,
            city: None,
            district: None,
            postal_code: None,
            birth_date: None,
            gender: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 表单填写用的客户资料
///
/// 由客户记录与报价请求中的车辆信息组合而成
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub tckn: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub gender: String,
    pub address: String,
    pub city: String,
    pub district: String,
    pub postal_code: String,
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub vehicle_year: Option<i32>,
    pub vehicle_plate: String,
}

impl CustomerProfile {
    /// 校验不通过的身份证号不会被填入表单
    pub fn build(customer: &Customer, quote: &Quote) -> Self {
        let (first_name, last_name) = split_name(&customer.name);
        let tckn = if validate_tckn(&customer.national_id) {
            customer.national_id.clone()
        } else {
            String::new()
        };
        Self {
            first_name,
            last_name,
            email: customer.email.clone().unwrap_or_default(),
            phone: customer.phone.clone().unwrap_or_default(),
            tckn,
            birth_date: customer
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            gender: customer.gender.clone().unwrap_or_default(),
            address: customer.address.clone().unwrap_or_default(),
            city: customer.city.clone().unwrap_or_default(),
            district: customer.district.clone().unwrap_or_default(),
            postal_code: customer.postal_code.clone().unwrap_or_default(),
            vehicle_brand: quote.vehicle_brand.clone().unwrap_or_default(),
            vehicle_model: quote.vehicle_model.clone().unwrap_or_default(),
            vehicle_year: quote.vehicle_year,
            vehicle_plate: quote.vehicle_plate.clone().unwrap_or_default(),
        }
    }

    /// 按表单字段名取值
    pub fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "first_name" => self.first_name.clone(),
            "last_name" => self.last_name.clone(),
            "email" => self.email.clone(),
            "phone" => self.phone.clone(),
            "tckn" => self.tckn.clone(),
            "birth_date" => self.birth_date.clone(),
            "gender" => self.gender.clone(),
            "address" => self.address.clone(),
            "city" => self.city.clone(),
            "district" => self.district.clone(),
            "postal_code" => self.postal_code.clone(),
            "vehicle_brand" => self.vehicle_brand.clone(),
            "vehicle_model" => self.vehicle_model.clone(),
            "vehicle_year" => self.vehicle_year.map(|y| y.to_string()).unwrap_or_default(),
            "vehicle_plate" => self.vehicle_plate.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// 姓名拆分：最后一个词作为姓，其余作为名
fn split_name(full: &str) -> (String, String) {
    let parts: Vec<&str> = full.split_whitespace().collect();
    match parts.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (only.to_string(), String::new()),
        [first @ .., last] => (first.join(" "), last.to_string()),
    }
}
