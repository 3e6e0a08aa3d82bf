// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_run::ScraperRun;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 抓取运行记录仓库特质
#[async_trait]
pub trait ScrapeRunRepository: Send + Sync {
    async fn create(&self, run: &ScraperRun) -> Result<ScraperRun, RepositoryError>;
    async fn update(&self, run: &ScraperRun) -> Result<ScraperRun, RepositoryError>;
    /// 目标的运行历史，最新的在前
    async fn list_by_target(
        &self,
        target_id: Uuid,
        limit: u64,
    ) -> Result<Vec<ScraperRun>, RepositoryError>;
    /// 删除截止时间之前创建的运行记录
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;
}
