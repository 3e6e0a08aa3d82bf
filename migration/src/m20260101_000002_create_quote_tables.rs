// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 客户、报价请求、抓取报价与保单表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Customers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Customers::NationalId).string().not_null())
                    .col(ColumnDef::new(Customers::Name).string().not_null())
                    .col(ColumnDef::new(Customers::Email).string().null())
                    .col(ColumnDef::new(Customers::Phone).string().null())
                    .col(ColumnDef::new(Customers::Address).text().null())
                    .col(ColumnDef::new(Customers::City).string().null())
                    .col(ColumnDef::new(Customers::District).string().null())
                    .col(ColumnDef::new(Customers::PostalCode).string().null())
                    .col(ColumnDef::new(Customers::BirthDate).date().null())
                    .col(ColumnDef::new(Customers::Gender).string().null())
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Customers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_customers_national_id")
                    .table(Customers::Table)
                    .col(Customers::NationalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Quotes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Quotes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Quotes::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Quotes::ProductId).uuid().null())
                    .col(ColumnDef::new(Quotes::AgentId).uuid().null())
                    .col(ColumnDef::new(Quotes::VehiclePlate).string().null())
                    .col(ColumnDef::new(Quotes::VehicleYear).integer().null())
                    .col(ColumnDef::new(Quotes::VehicleBrand).string().null())
                    .col(ColumnDef::new(Quotes::VehicleModel).string().null())
                    .col(ColumnDef::new(Quotes::CoverageType).string().null())
                    .col(ColumnDef::new(Quotes::StartDate).date().null())
                    .col(ColumnDef::new(Quotes::EndDate).date().null())
                    .col(ColumnDef::new(Quotes::AdditionalInfo).json().null())
                    .col(
                        ColumnDef::new(Quotes::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Quotes::ValidUntil)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Quotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Quotes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ScrapedQuotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapedQuotes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapedQuotes::QuoteId).uuid().not_null())
                    .col(ColumnDef::new(ScrapedQuotes::CompanyName).string().not_null())
                    .col(ColumnDef::new(ScrapedQuotes::CompanyLogo).string().null())
                    .col(ColumnDef::new(ScrapedQuotes::Premium).double().not_null())
                    .col(ColumnDef::new(ScrapedQuotes::CoverageAmount).double().null())
                    .col(ColumnDef::new(ScrapedQuotes::Discount).double().null())
                    .col(ColumnDef::new(ScrapedQuotes::FinalPrice).double().not_null())
                    .col(ColumnDef::new(ScrapedQuotes::Status).string().not_null())
                    .col(ColumnDef::new(ScrapedQuotes::ErrorMessage).text().null())
                    .col(ColumnDef::new(ScrapedQuotes::RawData).json().null())
                    .col(
                        ColumnDef::new(ScrapedQuotes::ScrapedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScrapedQuotes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_scraped_quotes_quote_company")
                    .table(ScrapedQuotes::Table)
                    .col(ScrapedQuotes::QuoteId)
                    .col(ScrapedQuotes::CompanyName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Policies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Policies::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Policies::CustomerId).uuid().not_null())
                    .col(ColumnDef::new(Policies::ProductId).uuid().null())
                    .col(ColumnDef::new(Policies::AgentId).uuid().null())
                    .col(ColumnDef::new(Policies::QuoteId).uuid().not_null())
                    .col(ColumnDef::new(Policies::ScrapedQuoteId).uuid().not_null())
                    .col(ColumnDef::new(Policies::PolicyNumber).string().not_null())
                    .col(ColumnDef::new(Policies::CompanyName).string().not_null())
                    .col(ColumnDef::new(Policies::Premium).double().not_null())
                    .col(ColumnDef::new(Policies::Status).string().not_null())
                    .col(ColumnDef::new(Policies::StartDate).date().null())
                    .col(ColumnDef::new(Policies::EndDate).date().null())
                    .col(
                        ColumnDef::new(Policies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Policies::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_policies_policy_number")
                    .table(Policies::Table)
                    .col(Policies::PolicyNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Policies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScrapedQuotes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Quotes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    NationalId,
    Name,
    Email,
    Phone,
    Address,
    City,
    District,
    PostalCode,
    BirthDate,
    Gender,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Quotes {
    Table,
    Id,
    CustomerId,
    ProductId,
    AgentId,
    VehiclePlate,
    VehicleYear,
    VehicleBrand,
    VehicleModel,
    CoverageType,
    StartDate,
    EndDate,
    AdditionalInfo,
    Status,
    ValidUntil,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ScrapedQuotes {
    Table,
    Id,
    QuoteId,
    CompanyName,
    CompanyLogo,
    Premium,
    CoverageAmount,
    Discount,
    FinalPrice,
    Status,
    ErrorMessage,
    RawData,
    ScrapedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Policies {
    Table,
    Id,
    CustomerId,
    ProductId,
    AgentId,
    QuoteId,
    ScrapedQuoteId,
    PolicyNumber,
    CompanyName,
    Premium,
    Status,
    StartDate,
    EndDate,
    CreatedAt,
    UpdatedAt,
}
