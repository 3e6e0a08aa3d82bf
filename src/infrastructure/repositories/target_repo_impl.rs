// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::ScraperTarget;
use crate::domain::repositories::target_repository::TargetRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::scraper_target as target_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// 抓取目标仓库实现
#[derive(Clone)]
pub struct TargetRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl TargetRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn list_filtered(
        &self,
        column: Option<target_entity::Column>,
    ) -> Result<Vec<ScraperTarget>, RepositoryError> {
        let mut query = target_entity::Entity::find();
        if let Some(column) = column {
            query = query.filter(column.eq(true));
        }
        let models = query
            .order_by_asc(target_entity::Column::Name)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }
}

impl From<target_entity::Model> for ScraperTarget {
    fn from(model: target_entity::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            logo_url: model.logo_url,
            base_url: model.base_url,
            enabled: model.enabled,
            is_active: model.is_active,
            use_headless: model.use_headless,
            rate_limit: model.rate_limit,
            headers_json: model.headers_json,
            cookies_json: model.cookies_json,
            selector_json: model.selector_json,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<ScraperTarget> for target_entity::ActiveModel {
    fn from(target: ScraperTarget) -> Self {
        Self {
            id: Set(target.id),
            name: Set(target.name),
            logo_url: Set(target.logo_url),
            base_url: Set(target.base_url),
            enabled: Set(target.enabled),
            is_active: Set(target.is_active),
            use_headless: Set(target.use_headless),
            rate_limit: Set(target.rate_limit),
            headers_json: Set(target.headers_json),
            cookies_json: Set(target.cookies_json),
            selector_json: Set(target.selector_json),
            created_at: Set(target.created_at),
            updated_at: Set(target.updated_at),
        }
    }
}

#[async_trait]
impl TargetRepository for TargetRepositoryImpl {
    async fn create(&self, target: &ScraperTarget) -> Result<ScraperTarget, RepositoryError> {
        let model: target_entity::ActiveModel = target.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(target.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScraperTarget>, RepositoryError> {
        let model = target_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn update(&self, target: &ScraperTarget) -> Result<ScraperTarget, RepositoryError> {
        let mut target = target.clone();
        target.updated_at = Utc::now().fixed_offset();
        let model: target_entity::ActiveModel = target.clone().into();
        let updated = model.update(self.db.as_ref()).await?;
        Ok(updated.into())
    }

    async fn list_all(&self) -> Result<Vec<ScraperTarget>, RepositoryError> {
        self.list_filtered(None).await
    }

    async fn list_enabled(&self) -> Result<Vec<ScraperTarget>, RepositoryError> {
        self.list_filtered(Some(target_entity::Column::Enabled)).await
    }

    async fn list_active(&self) -> Result<Vec<ScraperTarget>, RepositoryError> {
        self.list_filtered(Some(target_entity::Column::IsActive)).await
    }
}
