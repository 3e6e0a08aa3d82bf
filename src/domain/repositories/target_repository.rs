// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::ScraperTarget;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 抓取目标仓库特质
#[async_trait]
pub trait TargetRepository: Send + Sync {
    async fn create(&self, target: &ScraperTarget) -> Result<ScraperTarget, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScraperTarget>, RepositoryError>;
    async fn update(&self, target: &ScraperTarget) -> Result<ScraperTarget, RepositoryError>;
    /// 全部目标，按名称排序
    async fn list_all(&self) -> Result<Vec<ScraperTarget>, RepositoryError>;
    /// `enabled = true` 的目标，参与全量抓取
    async fn list_enabled(&self) -> Result<Vec<ScraperTarget>, RepositoryError>;
    /// `is_active = true` 的目标，参与报价抓取
    async fn list_active(&self) -> Result<Vec<ScraperTarget>, RepositoryError>;
}
