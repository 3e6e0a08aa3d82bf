// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_run::{ScrapeStats, ScraperRun};
use crate::domain::repositories::scrape_run_repository::ScrapeRunRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::scraper_run as run_entity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 抓取运行记录仓库实现
#[derive(Clone)]
pub struct ScrapeRunRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ScrapeRunRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<run_entity::Model> for ScraperRun {
    fn from(model: run_entity::Model) -> Self {
        Self {
            id: model.id,
            target_id: model.target_id,
            status: model.status.parse().unwrap_or_default(),
            started_at: model.started_at,
            finished_at: model.finished_at,
            stats: model
                .stats_json
                .and_then(|v| serde_json::from_value::<ScrapeStats>(v).ok()),
            error_msg: model.error_msg,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<ScraperRun> for run_entity::ActiveModel {
    fn from(run: ScraperRun) -> Self {
        Self {
            id: Set(run.id),
            target_id: Set(run.target_id),
            status: Set(run.status.to_string()),
            started_at: Set(run.started_at),
            finished_at: Set(run.finished_at),
            stats_json: Set(run.stats.and_then(|s| serde_json::to_value(s).ok())),
            error_msg: Set(run.error_msg),
            created_at: Set(run.created_at),
            updated_at: Set(run.updated_at),
        }
    }
}

#[async_trait]
impl ScrapeRunRepository for ScrapeRunRepositoryImpl {
    async fn create(&self, run: &ScraperRun) -> Result<ScraperRun, RepositoryError> {
        let model: run_entity::ActiveModel = run.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(run.clone())
    }

    async fn update(&self, run: &ScraperRun) -> Result<ScraperRun, RepositoryError> {
        let model: run_entity::ActiveModel = run.clone().into();
        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn list_by_target(
        &self,
        target_id: Uuid,
        limit: u64,
    ) -> Result<Vec<ScraperRun>, RepositoryError> {
        let models = run_entity::Entity::find()
            .filter(run_entity::Column::TargetId.eq(target_id))
            .order_by_desc(run_entity::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = run_entity::Entity::delete_many()
            .filter(run_entity::Column::CreatedAt.lt(cutoff.fixed_offset()))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
