// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::customer::Customer;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 客户仓库特质
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create(&self, customer: &Customer) -> Result<Customer, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, RepositoryError>;
    async fn find_by_national_id(&self, national_id: &str) -> Result<Option<Customer>, RepositoryError>;
}
