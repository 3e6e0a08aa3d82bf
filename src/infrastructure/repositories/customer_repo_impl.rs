// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::customer::Customer;
use crate::domain::repositories::customer_repository::CustomerRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::customer as customer_entity;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use uuid::Uuid;

/// 客户仓库实现
#[derive(Clone)]
pub struct CustomerRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl CustomerRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<customer_entity::Model> for Customer {
    fn from(model: customer_entity::Model) -> Self {
        Self {
            id: model.id,
            national_id: model.national_id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            city: model.city,
            district: model.district,
            postal_code: model.postal_code,
            birth_date: model.birth_date,
            gender: model.gender,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<Customer> for customer_entity::ActiveModel {
    fn from(customer: Customer) -> Self {
        Self {
            id: Set(customer.id),
            national_id: Set(customer.national_id),
            name: Set(customer.name),
            email: Set(customer.email),
            phone: Set(customer.phone),
            address: Set(customer.address),
            city: Set(customer.city),
            district: Set(customer.district),
            postal_code: Set(customer.postal_code),
            birth_date: Set(customer.birth_date),
            gender: Set(customer.gender),
            created_at: Set(customer.created_at),
            updated_at: Set(customer.updated_at),
        }
    }
}

#[async_trait]
impl CustomerRepository for CustomerRepositoryImpl {
    async fn create(&self, customer: &Customer) -> Result<Customer, RepositoryError> {
        let model: customer_entity::ActiveModel = customer.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(customer.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, RepositoryError> {
        let model = customer_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_by_national_id(&self, national_id: &str) -> Result<Option<Customer>, RepositoryError> {
        let model = customer_entity::Entity::find()
            .filter(customer_entity::Column::NationalId.eq(national_id))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }
}
