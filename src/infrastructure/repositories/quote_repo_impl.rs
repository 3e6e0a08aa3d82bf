// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::policy::Policy;
use crate::domain::models::quote::{Quote, QuoteStatus};
use crate::domain::models::scraped_quote::{OfferStatus, ScrapedQuote};
use crate::domain::models::scraped_row::InsertOutcome;
use crate::domain::repositories::quote_repository::QuoteRepository;
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::{
    policy as policy_entity, quote as quote_entity, scraped_quote as offer_entity,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 报价仓库实现
#[derive(Clone)]
pub struct QuoteRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl QuoteRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<quote_entity::Model> for Quote {
    fn from(model: quote_entity::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            product_id: model.product_id,
            agent_id: model.agent_id,
            vehicle_plate: model.vehicle_plate,
            vehicle_year: model.vehicle_year,
            vehicle_brand: model.vehicle_brand,
            vehicle_model: model.vehicle_model,
            coverage_type: model.coverage_type,
            start_date: model.start_date,
            end_date: model.end_date,
            additional_info: model.additional_info,
            status: model.status.parse().unwrap_or_default(),
            valid_until: model.valid_until,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<Quote> for quote_entity::ActiveModel {
    fn from(quote: Quote) -> Self {
        Self {
            id: Set(quote.id),
            customer_id: Set(quote.customer_id),
            product_id: Set(quote.product_id),
            agent_id: Set(quote.agent_id),
            vehicle_plate: Set(quote.vehicle_plate),
            vehicle_year: Set(quote.vehicle_year),
            vehicle_brand: Set(quote.vehicle_brand),
            vehicle_model: Set(quote.vehicle_model),
            coverage_type: Set(quote.coverage_type),
            start_date: Set(quote.start_date),
            end_date: Set(quote.end_date),
            additional_info: Set(quote.additional_info),
            status: Set(quote.status.to_string()),
            valid_until: Set(quote.valid_until),
            created_at: Set(quote.created_at),
            updated_at: Set(quote.updated_at),
        }
    }
}

impl From<offer_entity::Model> for ScrapedQuote {
    fn from(model: offer_entity::Model) -> Self {
        Self {
            id: model.id,
            quote_id: model.quote_id,
            company_name: model.company_name,
            company_logo: model.company_logo,
            premium: model.premium,
            coverage_amount: model.coverage_amount,
            discount: model.discount,
            final_price: model.final_price,
            status: model.status.parse().unwrap_or(OfferStatus::Error),
            error_message: model.error_message,
            raw_data: model.raw_data,
            scraped_at: model.scraped_at,
            created_at: model.created_at,
        }
    }
}

impl From<ScrapedQuote> for offer_entity::ActiveModel {
    fn from(offer: ScrapedQuote) -> Self {
        Self {
            id: Set(offer.id),
            quote_id: Set(offer.quote_id),
            company_name: Set(offer.company_name),
            company_logo: Set(offer.company_logo),
            premium: Set(offer.premium),
            coverage_amount: Set(offer.coverage_amount),
            discount: Set(offer.discount),
            final_price: Set(offer.final_price),
            status: Set(offer.status.to_string()),
            error_message: Set(offer.error_message),
            raw_data: Set(offer.raw_data),
            scraped_at: Set(offer.scraped_at),
            created_at: Set(offer.created_at),
        }
    }
}

/// 条件更新报价请求状态，返回受影响行数
async fn compare_and_set<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    from: QuoteStatus,
    to: QuoteStatus,
) -> Result<u64, RepositoryError> {
    let result = quote_entity::Entity::update_many()
        .col_expr(quote_entity::Column::Status, Expr::value(to.to_string()))
        .col_expr(
            quote_entity::Column::UpdatedAt,
            Expr::value(Utc::now().fixed_offset()),
        )
        .filter(quote_entity::Column::Id.eq(id))
        .filter(quote_entity::Column::Status.eq(from.to_string()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

#[async_trait]
impl QuoteRepository for QuoteRepositoryImpl {
    async fn create(&self, quote: &Quote) -> Result<Quote, RepositoryError> {
        let model: quote_entity::ActiveModel = quote.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(quote.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Quote>, RepositoryError> {
        let model = quote_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn transition(
        &self,
        id: Uuid,
        from: QuoteStatus,
        to: QuoteStatus,
    ) -> Result<bool, RepositoryError> {
        if !from.can_transition_to(to) {
            return Err(RepositoryError::Conflict(format!(
                "illegal quote transition {} -> {}",
                from, to
            )));
        }
        Ok(compare_and_set(self.db.as_ref(), id, from, to).await? == 1)
    }

    async fn create_offer(&self, offer: &ScrapedQuote) -> Result<InsertOutcome, RepositoryError> {
        let model: offer_entity::ActiveModel = offer.clone().into();
        let inserted = offer_entity::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    offer_entity::Column::QuoteId,
                    offer_entity::Column::CompanyName,
                ])
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

    async fn has_offer(&self, quote_id: Uuid, company_name: &str) -> Result<bool, RepositoryError> {
        let count = offer_entity::Entity::find()
            .filter(offer_entity::Column::QuoteId.eq(quote_id))
            .filter(offer_entity::Column::CompanyName.eq(company_name))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn find_offer(&self, id: Uuid) -> Result<Option<ScrapedQuote>, RepositoryError> {
        let model = offer_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list_offers_by_price(&self, quote_id: Uuid) -> Result<Vec<ScrapedQuote>, RepositoryError> {
        let models = offer_entity::Entity::find()
            .filter(offer_entity::Column::QuoteId.eq(quote_id))
            .order_by_asc(offer_entity::Column::FinalPrice)
            .order_by_asc(offer_entity::Column::CompanyName)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn approve(&self, quote_id: Uuid, policy: &Policy) -> Result<Policy, RepositoryError> {
        let txn = self.db.begin().await?;

        let changed =
            compare_and_set(&txn, quote_id, QuoteStatus::Completed, QuoteStatus::Approved).await?;
        if changed == 0 {
            txn.rollback().await?;
            return Err(RepositoryError::Conflict(format!(
                "quote {} is not awaiting approval",
                quote_id
            )));
        }

        let model: policy_entity::ActiveModel = policy.clone().into();
        if let Err(e) = model.insert(&txn).await {
            txn.rollback().await?;
            return Err(e.into());
        }
        txn.commit().await?;

        Ok(policy.clone())
    }
}
