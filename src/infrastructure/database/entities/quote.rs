// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "quotes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub product_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub vehicle_plate: Option<String>,
    pub vehicle_year: Option<i32>,
    pub vehicle_brand: Option<String>,
    pub vehicle_model: Option<String>,
    pub coverage_type: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub additional_info: Option<Json>,
    pub status: String,
    pub valid_until: Option<ChronoDateTimeWithTimeZone>,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub updated_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
