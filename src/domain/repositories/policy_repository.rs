// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::policy::Policy;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 保单仓库特质
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Policy>, RepositoryError>;
    async fn find_by_quote(&self, quote_id: Uuid) -> Result<Option<Policy>, RepositoryError>;
}
