// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scraped_row::ScrapedRow;
use std::collections::BTreeMap;
use uuid::Uuid;

/// 选出需要删除的重复记录
///
/// 按 `hash_key` 分组，每组保留 `created_at` 最早的一条（相同时间按 id 决定），
/// 返回其余记录的 id
pub fn select_duplicates(rows: &[ScrapedRow]) -> Vec<Uuid> {
    let mut groups: BTreeMap<&str, Vec<&ScrapedRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.hash_key.as_str()).or_default().push(row);
    }

    groups
        .into_values()
        .filter(|group| group.len() > 1)
        .flat_map(|mut group| {
            group.sort_by_key(|row| (row.created_at, row.id));
            group.into_iter().skip(1).map(|row| row.id).collect::<Vec<_>>()
        })
        .collect()
}

/// 为抓取记录补充派生字段
///
/// 目前只补充 `city_normalized`；返回值表示规范化字段是否发生变化
pub fn enrich_row(row: &mut ScrapedRow) -> bool {
    let Some(city) = row
        .normalized
        .get("city")
        .and_then(|v| v.as_str())
        .filter(|c| !c.trim().is_empty())
    else {
        return false;
    };

    let canonical = serde_json::Value::String(super::normalization::normalize_city(city));
    if row.normalized.get("city_normalized") == Some(&canonical) {
        return false;
    }
    row.normalized.insert("city_normalized".to_string(), canonical);
    true
}
