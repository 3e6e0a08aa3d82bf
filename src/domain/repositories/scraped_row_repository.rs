// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scraped_row::{FieldMap, InsertOutcome, ScrapedRow};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 重复哈希统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateHash {
    pub hash_key: String,
    pub count: i64,
}

/// 抓取数据仓库特质
#[async_trait]
pub trait ScrapedRowRepository: Send + Sync {
    /// 根据哈希查找记录
    async fn find_by_hash_key(&self, hash_key: &str) -> Result<Option<ScrapedRow>, RepositoryError>;
    /// 插入记录，哈希已存在时不做任何修改并返回 `Duplicate`
    async fn insert_if_absent(&self, row: &ScrapedRow) -> Result<InsertOutcome, RepositoryError>;
    /// 目标的全部记录，按创建时间升序
    async fn list_by_target(&self, target_id: Uuid) -> Result<Vec<ScrapedRow>, RepositoryError>;
    /// 目标下某个哈希的全部记录，按创建时间升序
    async fn list_by_hash(
        &self,
        target_id: Uuid,
        hash_key: &str,
    ) -> Result<Vec<ScrapedRow>, RepositoryError>;
    /// 更新规范化字段
    async fn update_normalized(&self, id: Uuid, normalized: &FieldMap) -> Result<(), RepositoryError>;
    /// 分组统计出现多于一次的哈希
    async fn find_duplicate_hashes(
        &self,
        target_id: Uuid,
    ) -> Result<Vec<DuplicateHash>, RepositoryError>;
    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64, RepositoryError>;
    /// 删除截止时间之前创建的记录
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;
    async fn count_by_target(&self, target_id: Uuid) -> Result<u64, RepositoryError>;
}
