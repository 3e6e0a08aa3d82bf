// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 字段规范化与内容哈希
//!
//! 这里的函数都是纯函数，不依赖任何 IO

use crate::domain::models::scraped_row::FieldMap;
use chrono::NaiveDate;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("valid amount pattern"));

/// 城市规范化查找表
const CITY_TABLE: [(&str, &str); 5] = [
    ("istanbul", "İstanbul"),
    ("ankara", "Ankara"),
    ("izmir", "İzmir"),
    ("bursa", "Bursa"),
    ("antalya", "Antalya"),
];

/// 校验土耳其身份证号（TCKN）
///
/// 必须是 11 位数字，且前 10 位之和对 10 取模等于第 11 位
pub fn validate_tckn(tckn: &str) -> bool {
    if tckn.len() != 11 || !tckn.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = tckn.bytes().map(|b| u32::from(b - b'0')).collect();
    let sum: u32 = digits[..10].iter().sum();
    sum % 10 == digits[10]
}

/// 规范化土耳其电话号码
///
/// 先去掉所有非数字字符；以 5 开头的 10 位手机号补上国家码 90
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 && digits.starts_with('5') {
        format!("90{}", digits)
    } else {
        digits
    }
}

/// 城市名规范化，不在查找表中的城市原样返回（去掉首尾空白）
pub fn normalize_city(city: &str) -> String {
    let trimmed = city.trim();
    let key = trimmed.to_lowercase();
    CITY_TABLE
        .iter()
        .find(|(raw, canonical)| *raw == key || *canonical == trimmed)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// 按字段名规范化单个抓取值
pub fn normalize_value(field: &str, value: &str) -> String {
    let value = value.trim();
    match field {
        "phone" => normalize_phone(value),
        "email" => value.to_lowercase(),
        "date" => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|_| value.to_string()),
        _ => value.to_string(),
    }
}

/// 规范化整组字段
pub fn normalize_fields(raw: &BTreeMap<String, String>) -> FieldMap {
    raw.iter()
        .map(|(field, value)| {
            (
                field.clone(),
                serde_json::Value::String(normalize_value(field, value)),
            )
        })
        .collect()
}

/// 计算内容哈希
///
/// 对 `base_url` 与按键排序的 `key:value` 序列做 SHA-256，
/// 因此同一组字段无论提取顺序如何都得到相同的哈希
pub fn content_hash(base_url: &str, fields: &FieldMap) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base_url.as_bytes());
    for (key, value) in fields {
        hasher.update(key.as_bytes());
        hasher.update(b":");
        match value {
            serde_json::Value::String(s) => hasher.update(s.as_bytes()),
            other => hasher.update(other.to_string().as_bytes()),
        }
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// 从价格文本中解析金额
///
/// 支持 `1.234,56 TL`（土耳其格式）与 `1,234.56` 两种写法
pub fn parse_amount(text: &str) -> Option<f64> {
    let raw = AMOUNT.find(text)?.as_str().trim_end_matches(['.', ',']);
    let last_dot = raw.rfind('.');
    let last_comma = raw.rfind(',');

    let normalized = match (last_dot, last_comma) {
        // Both present: the later one is the decimal separator
        (Some(d), Some(c)) if c > d => raw.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => raw.replace(',', ""),
        (None, Some(c)) if is_grouping(raw, c, ',') => raw.replace(',', ""),
        (None, Some(_)) => raw.replace(',', "."),
        (Some(d), None) if is_grouping(raw, d, '.') => raw.replace('.', ""),
        _ => raw.to_string(),
    };

    normalized.parse().ok()
}

/// 单一分隔符出现多次，或其后恰好三位数字时视为千位分隔
fn is_grouping(raw: &str, last: usize, separator: char) -> bool {
    raw.matches(separator).count() > 1 || raw.len() - last - 1 == 3
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 价格展示格式
pub fn format_price(price: f64) -> String {
    format!("{:.2} TL", price)
}
