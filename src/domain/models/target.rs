// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 抓取目标
///
/// 一个可抓取的网站（通常是一家保险公司）。`use_headless` 决定
/// 使用静态采集器还是无头浏览器引擎。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperTarget {
    pub id: Uuid,
    /// 显示名称，同时作为公司名用于字段映射查找
    pub name: String,
    pub logo_url: Option<String>,
    pub base_url: String,
    /// 是否参与全量抓取
    pub enabled: bool,
    /// 是否参与报价抓取
    pub is_active: bool,
    pub use_headless: bool,
    /// 每分钟请求预算
    pub rate_limit: i32,
    /// 自定义请求头
    pub headers_json: Option<serde_json::Value>,
    /// 自定义 Cookie
    pub cookies_json: Option<serde_json::Value>,
    /// 字段选择器覆盖
    pub selector_json: Option<serde_json::Value>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl ScraperTarget {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let now = Utc::now().fixed_offset();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            logo_url: None,
            base_url: base_url.into(),
            enabled: true,
            is_active: true,
            use_headless: false,
            rate_limit: 1000,
            headers_json: None,
            cookies_json: None,
            selector_json: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 自定义请求头，非字符串值会被忽略
    pub fn headers(&self) -> BTreeMap<String, String> {
        string_map(self.headers_json.as_ref())
    }

    /// 自定义 Cookie
    pub fn cookies(&self) -> BTreeMap<String, String> {
        string_map(self.cookies_json.as_ref())
    }

    /// 显式配置的字段选择器
    pub fn custom_selectors(&self) -> Option<BTreeMap<String, String>> {
        let selectors = string_map(self.selector_json.as_ref());
        if selectors.is_empty() {
            None
        } else {
            Some(selectors)
        }
    }
}

fn string_map(value: Option<&serde_json::Value>) -> BTreeMap<String, String> {
    value
        .and_then(|v| v.as_object())
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}
