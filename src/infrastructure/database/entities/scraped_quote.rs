// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scraped_quotes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub quote_id: Uuid,
    pub company_name: String,
    pub company_logo: Option<String>,
    #[sea_orm(column_type = "Double")]
    pub premium: f64,
    #[sea_orm(column_type = "Double", nullable)]
    pub coverage_amount: Option<f64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub discount: Option<f64>,
    #[sea_orm(column_type = "Double")]
    pub final_price: f64,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub raw_data: Option<Json>,
    pub scraped_at: ChronoDateTimeWithTimeZone,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
