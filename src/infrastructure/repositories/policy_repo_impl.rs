// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::policy::Policy;
use crate::domain::repositories::policy_repository::PolicyRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::policy as policy_entity;
use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 保单仓库实现
#[derive(Clone)]
pub struct PolicyRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl PolicyRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<policy_entity::Model> for Policy {
    fn from(model: policy_entity::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            product_id: model.product_id,
            agent_id: model.agent_id,
            quote_id: model.quote_id,
            scraped_quote_id: model.scraped_quote_id,
            policy_number: model.policy_number,
            company_name: model.company_name,
            premium: model.premium,
            status: model.status.parse().unwrap_or_default(),
            start_date: model.start_date,
            end_date: model.end_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<Policy> for policy_entity::ActiveModel {
    fn from(policy: Policy) -> Self {
        Self {
            id: Set(policy.id),
            customer_id: Set(policy.customer_id),
            product_id: Set(policy.product_id),
            agent_id: Set(policy.agent_id),
            quote_id: Set(policy.quote_id),
            scraped_quote_id: Set(policy.scraped_quote_id),
            policy_number: Set(policy.policy_number),
            company_name: Set(policy.company_name),
            premium: Set(policy.premium),
            status: Set(policy.status.to_string()),
            start_date: Set(policy.start_date),
            end_date: Set(policy.end_date),
            created_at: Set(policy.created_at),
            updated_at: Set(policy.updated_at),
        }
    }
}

#[async_trait]
impl PolicyRepository for PolicyRepositoryImpl {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Policy>, RepositoryError> {
        let model = policy_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_quote(&self, quote_id: Uuid) -> Result<Option<Policy>, RepositoryError> {
        let model = policy_entity::Entity::find()
            .filter(policy_entity::Column::QuoteId.eq(quote_id))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }
}
