// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::policy::Policy;
use crate::domain::models::quote::{Quote, QuoteStatus};
use crate::domain::models::scraped_quote::ScrapedQuote;
use crate::domain::models::scraped_row::InsertOutcome;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 报价仓库特质
///
/// 管理报价请求及其下属的公司报价
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(&self, quote: &Quote) -> Result<Quote, RepositoryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Quote>, RepositoryError>;
    /// 条件更新状态，仅当当前状态为 `from` 时生效
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 状态已更新
    /// * `Ok(false)` - 当前状态不是 `from`
    async fn transition(
        &self,
        id: Uuid,
        from: QuoteStatus,
        to: QuoteStatus,
    ) -> Result<bool, RepositoryError>;
    /// 保存一条公司报价
    ///
    /// 每个报价请求下每家公司最多一条，已存在时不做修改并返回 `Duplicate`
    async fn create_offer(&self, offer: &ScrapedQuote) -> Result<InsertOutcome, RepositoryError>;
    async fn has_offer(&self, quote_id: Uuid, company_name: &str) -> Result<bool, RepositoryError>;
    async fn find_offer(&self, id: Uuid) -> Result<Option<ScrapedQuote>, RepositoryError>;
    /// 报价请求下的全部报价，按最终价格升序
    async fn list_offers_by_price(&self, quote_id: Uuid) -> Result<Vec<ScrapedQuote>, RepositoryError>;
    /// 在同一事务中写入保单并把报价请求从 Completed 改为 Approved
    ///
    /// 报价请求已不是 Completed 时返回 `Conflict`，保单号重复时返回 `Duplicate` 且不修改状态
    async fn approve(&self, quote_id: Uuid, policy: &Policy) -> Result<Policy, RepositoryError>;
}
