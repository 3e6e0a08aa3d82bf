// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 字段名到字段值的有序映射
pub type FieldMap = BTreeMap<String, serde_json::Value>;

/// 内容寻址的抓取记录
///
/// `hash_key` 在存储层唯一：同一 (URL, 字段集) 的两次抽取只能留下一行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedRow {
    pub id: Uuid,
    pub target_id: Uuid,
    pub hash_key: String,
    pub url: String,
    /// 类型标签（选择器方案名）
    pub row_type: String,
    pub raw: FieldMap,
    pub normalized: FieldMap,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl ScrapedRow {
    pub fn new(
        target_id: Uuid,
        hash_key: String,
        url: String,
        row_type: String,
        raw: FieldMap,
        normalized: FieldMap,
    ) -> Self {
        let now = Utc::now().fixed_offset();
        Self {
            id: Uuid::new_v4(),
            target_id,
            hash_key,
            url,
            row_type,
            raw,
            normalized,
            created_at: now,
            updated_at: now,
        }
    }
}

/// 插入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// 唯一键已存在，视为无操作的成功
    Duplicate,
}
