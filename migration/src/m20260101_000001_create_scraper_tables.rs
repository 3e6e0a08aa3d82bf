// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 抓取目标、运行记录与抓取数据表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    /// 应用数据库迁移
    ///
    /// # 参数
    ///
    /// * `manager` - 数据库模式管理器
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 迁移成功
    /// * `Err(DbErr)` - 迁移失败
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. scraper_targets
        manager
            .create_table(
                Table::create()
                    .table(ScraperTargets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScraperTargets::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScraperTargets::Name).string().not_null())
                    .col(ColumnDef::new(ScraperTargets::LogoUrl).string().null())
                    .col(ColumnDef::new(ScraperTargets::BaseUrl).string().not_null())
                    .col(
                        ColumnDef::new(ScraperTargets::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ScraperTargets::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ScraperTargets::UseHeadless)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ScraperTargets::RateLimit)
                            .integer()
                            .not_null()
                            .default(1000),
                    )
                    .col(ColumnDef::new(ScraperTargets::HeadersJson).json().null())
                    .col(ColumnDef::new(ScraperTargets::CookiesJson).json().null())
                    .col(ColumnDef::new(ScraperTargets::SelectorJson).json().null())
                    .col(
                        ColumnDef::new(ScraperTargets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScraperTargets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. scraper_runs (append-only history)
        manager
            .create_table(
                Table::create()
                    .table(ScraperRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScraperRuns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScraperRuns::TargetId).uuid().not_null())
                    .col(ColumnDef::new(ScraperRuns::Status).string().not_null())
                    .col(
                        ColumnDef::new(ScraperRuns::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScraperRuns::FinishedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ScraperRuns::StatsJson).json().null())
                    .col(ColumnDef::new(ScraperRuns::ErrorMsg).text().null())
                    .col(
                        ColumnDef::new(ScraperRuns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScraperRuns::UpdatedAt)
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
                    .name("idx_scraper_runs_target")
                    .table(ScraperRuns::Table)
                    .col(ScraperRuns::TargetId)
                    .to_owned(),
            )
            .await?;

        // 3. scraped_rows
        manager
            .create_table(
                Table::create()
                    .table(ScrapedRows::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapedRows::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapedRows::TargetId).uuid().not_null())
                    .col(ColumnDef::new(ScrapedRows::HashKey).string().not_null())
                    .col(ColumnDef::new(ScrapedRows::Url).string().not_null())
                    .col(ColumnDef::new(ScrapedRows::RowType).string().not_null())
                    .col(ColumnDef::new(ScrapedRows::RawJson).json().not_null())
                    .col(ColumnDef::new(ScrapedRows::NormalizedJson).json().not_null())
                    .col(
                        ColumnDef::new(ScrapedRows::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScrapedRows::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // The unique hash key is the dedup safety net
        manager
            .create_index(
                Index::create()
                    .name("uq_scraped_rows_hash_key")
                    .table(ScrapedRows::Table)
                    .col(ScrapedRows::HashKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scraped_rows_target_created")
                    .table(ScrapedRows::Table)
                    .col(ScrapedRows::TargetId)
                    .col(ScrapedRows::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapedRows::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScraperRuns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScraperTargets::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScraperTargets {
    Table,
    Id,
    Name,
    LogoUrl,
    BaseUrl,
    Enabled,
    IsActive,
    UseHeadless,
    RateLimit,
    HeadersJson,
    CookiesJson,
    SelectorJson,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ScraperRuns {
    Table,
    Id,
    TargetId,
    Status,
    StartedAt,
    FinishedAt,
    StatsJson,
    ErrorMsg,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ScrapedRows {
    Table,
    Id,
    TargetId,
    HashKey,
    Url,
    RowType,
    RawJson,
    NormalizedJson,
    CreatedAt,
    UpdatedAt,
}
