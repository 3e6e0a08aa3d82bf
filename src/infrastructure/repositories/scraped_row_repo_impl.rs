// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scraped_row::{FieldMap, InsertOutcome, ScrapedRow};
use crate::domain::repositories::scraped_row_repository::{DuplicateHash, ScrapedRowRepository};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::scraped_row as row_entity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 抓取数据仓库实现
///
/// `hash_key` 上的唯一索引保证同一内容只写入一次
#[derive(Clone)]
pub struct ScrapedRowRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ScrapedRowRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn to_field_map(value: serde_json::Value) -> FieldMap {
    serde_json::from_value(value).unwrap_or_default()
}

fn to_json(map: &FieldMap) -> serde_json::Value {
    serde_json::Value::Object(map.clone().into_iter().collect())
}

impl From<row_entity::Model> for ScrapedRow {
    fn from(model: row_entity::Model) -> Self {
        Self {
            id: model.id,
            target_id: model.target_id,
            hash_key: model.hash_key,
            url: model.url,
            row_type: model.row_type,
            raw: to_field_map(model.raw_json),
            normalized: to_field_map(model.normalized_json),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&ScrapedRow> for row_entity::ActiveModel {
    fn from(row: &ScrapedRow) -> Self {
        Self {
            id: Set(row.id),
            target_id: Set(row.target_id),
            hash_key: Set(row.hash_key.clone()),
            url: Set(row.url.clone()),
            row_type: Set(row.row_type.clone()),
            raw_json: Set(to_json(&row.raw)),
            normalized_json: Set(to_json(&row.normalized)),
            created_at: Set(row.created_at),
            updated_at: Set(row.updated_at),
        }
    }
}

#[async_trait]
impl ScrapedRowRepository for ScrapedRowRepositoryImpl {
    async fn find_by_hash_key(&self, hash_key: &str) -> Result<Option<ScrapedRow>, RepositoryError> {
        let model = row_entity::Entity::find()
            .filter(row_entity::Column::HashKey.eq(hash_key))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn insert_if_absent(&self, row: &ScrapedRow) -> Result<InsertOutcome, RepositoryError> {
        let model: row_entity::ActiveModel = row.into();
        let inserted = row_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::column(row_entity::Column::HashKey)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;

        Ok(if inserted == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Inserted
        })
    }

    async fn list_by_target(&self, target_id: Uuid) -> Result<Vec<ScrapedRow>, RepositoryError> {
        let models = row_entity::Entity::find()
            .filter(row_entity::Column::TargetId.eq(target_id))
            .order_by_asc(row_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_by_hash(
        &self,
        target_id: Uuid,
        hash_key: &str,
    ) -> Result<Vec<ScrapedRow>, RepositoryError> {
        let models = row_entity::Entity::find()
            .filter(row_entity::Column::TargetId.eq(target_id))
            .filter(row_entity::Column::HashKey.eq(hash_key))
            .order_by_asc(row_entity::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update_normalized(&self, id: Uuid, normalized: &FieldMap) -> Result<(), RepositoryError> {
        let result = row_entity::Entity::update_many()
            .col_expr(row_entity::Column::NormalizedJson, Expr::value(to_json(normalized)))
            .col_expr(
                row_entity::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(row_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_duplicate_hashes(
        &self,
        target_id: Uuid,
    ) -> Result<Vec<DuplicateHash>, RepositoryError> {
        let groups: Vec<(String, i64)> = row_entity::Entity::find()
            .select_only()
            .column(row_entity::Column::HashKey)
            .column_as(Expr::col(row_entity::Column::Id).count(), "count")
            .filter(row_entity::Column::TargetId.eq(target_id))
            .group_by(row_entity::Column::HashKey)
            .having(Expr::expr(Expr::col(row_entity::Column::Id).count()).gt(1))
            .order_by_asc(row_entity::Column::HashKey)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        Ok(groups
            .into_iter()
            .map(|(hash_key, count)| DuplicateHash { hash_key, count })
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = row_entity::Entity::delete_many()
            .filter(row_entity::Column::Id.is_in(ids.to_vec()))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = row_entity::Entity::delete_many()
            .filter(row_entity::Column::CreatedAt.lt(cutoff.fixed_offset()))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn count_by_target(&self, target_id: Uuid) -> Result<u64, RepositoryError> {
        let count = row_entity::Entity::find()
            .filter(row_entity::Column::TargetId.eq(target_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }
}
