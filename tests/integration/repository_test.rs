// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::TestContext;
use quotrs::domain::models::policy::Policy;
use quotrs::domain::models::quote::{Quote, QuoteStatus};
use quotrs::domain::models::scraped_quote::ScrapedQuote;
use quotrs::domain::models::scraped_row::{FieldMap, InsertOutcome, ScrapedRow};
use quotrs::domain::repositories::RepositoryError;
use serde_json::json;

fn row(target_id: uuid::Uuid, hash: &str) -> ScrapedRow {
    let mut raw = FieldMap::new();
    raw.insert("title".to_string(), json!("Kasko"));
    ScrapedRow::new(
        target_id,
        hash.to_string(),
        "https://example.com".to_string(),
        "default".to_string(),
        raw.clone(),
        raw,
    )
}

#[tokio::test]
async fn test_hash_key_is_unique() {
    let ctx = TestContext::new().await;
    let target = ctx.add_target("Allianz", "https://www.allianz.com.tr").await;

    let first = ctx.rows.insert_if_absent(&row(target.id, "abc")).await.unwrap();
    let second = ctx.rows.insert_if_absent(&row(target.id, "abc")).await.unwrap();

    assert_eq!(first, InsertOutcome::Inserted);
    assert_eq!(second, InsertOutcome::Duplicate);
    assert_eq!(ctx.rows.count_by_target(target.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_enabled_and_active_target_lists() {
    let ctx = TestContext::new().await;
    ctx.add_target("Allianz", "https://www.allianz.com.tr").await;

    let mut disabled = ctx.add_target("Mapfre", "https://www.mapfre.com.tr").await;
    disabled.enabled = false;
    ctx.targets.update(&disabled).await.unwrap();

    let mut inactive = ctx.add_target("Aksigorta", "https://www.aksigorta.com.tr").await;
    inactive.is_active = false;
    ctx.targets.update(&inactive).await.unwrap();

    assert_eq!(ctx.targets.list_all().await.unwrap().len(), 3);
    assert_eq!(ctx.targets.list_enabled().await.unwrap().len(), 2);
    assert_eq!(ctx.targets.list_active().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_quote_transition_is_compare_and_set() {
    let ctx = TestContext::new().await;
    let customer = ctx.add_customer().await;
    let quote = ctx.quotes.create(&Quote::new(customer.id)).await.unwrap();

    assert!(ctx
        .quotes
        .transition(quote.id, QuoteStatus::Pending, QuoteStatus::Processing)
        .await
        .unwrap());
    // Second claim loses the race
    assert!(!ctx
        .quotes
        .transition(quote.id, QuoteStatus::Pending, QuoteStatus::Processing)
        .await
        .unwrap());

    let err = ctx
        .quotes
        .transition(quote.id, QuoteStatus::Processing, QuoteStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let stored = ctx.quotes.find_by_id(quote.id).await.unwrap().unwrap();
    assert_eq!(stored.status, QuoteStatus::Processing);
}

#[tokio::test]
async fn test_one_offer_per_company_and_quote() {
    let ctx = TestContext::new().await;
    let customer = ctx.add_customer().await;
    let quote = ctx.quotes.create(&Quote::new(customer.id)).await.unwrap();
    let other = ctx.quotes.create(&Quote::new(customer.id)).await.unwrap();

    let offer = |quote_id| ScrapedQuote::failed(quote_id, "Allianz".into(), None, "timeout".into());

    assert_eq!(
        ctx.quotes.create_offer(&offer(quote.id)).await.unwrap(),
        InsertOutcome::Inserted
    );
    assert_eq!(
        ctx.quotes.create_offer(&offer(quote.id)).await.unwrap(),
        InsertOutcome::Duplicate
    );
    // Same company under another quote is a separate offer
    assert_eq!(
        ctx.quotes.create_offer(&offer(other.id)).await.unwrap(),
        InsertOutcome::Inserted
    );

    assert_eq!(ctx.quotes.list_offers_by_price(quote.id).await.unwrap().len(), 1);
    assert!(ctx.quotes.has_offer(quote.id, "Allianz").await.unwrap());
    assert!(!ctx.quotes.has_offer(quote.id, "Mapfre").await.unwrap());
}

/// 创建一个已完成、带一条报价的报价请求
async fn completed_quote(ctx: &TestContext, customer_id: uuid::Uuid) -> (Quote, ScrapedQuote) {
    let quote = ctx.quotes.create(&Quote::new(customer_id)).await.unwrap();
    let offer = ScrapedQuote {
        premium: 1425.0,
        final_price: 1282.5,
        ..ScrapedQuote::failed(quote.id, "Allianz".into(), None, String::new())
    };
    ctx.quotes.create_offer(&offer).await.unwrap();
    for (from, to) in [
        (QuoteStatus::Pending, QuoteStatus::Processing),
        (QuoteStatus::Processing, QuoteStatus::Completed),
    ] {
        assert!(ctx.quotes.transition(quote.id, from, to).await.unwrap());
    }
    (quote, offer)
}

#[tokio::test]
async fn test_policy_number_collision_is_duplicate_and_rolls_back() {
    let ctx = TestContext::new().await;
    let customer = ctx.add_customer().await;
    let (first, first_offer) = completed_quote(&ctx, customer.id).await;
    let (second, second_offer) = completed_quote(&ctx, customer.id).await;

    let issued = ctx
        .quotes
        .approve(first.id, &Policy::issue(&first, &first_offer))
        .await
        .unwrap();

    let colliding = Policy {
        policy_number: issued.policy_number.clone(),
        ..Policy::issue(&second, &second_offer)
    };
    let err = ctx.quotes.approve(second.id, &colliding).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(_)), "{:?}", err);

    let stored = ctx.quotes.find_by_id(second.id).await.unwrap().unwrap();
    assert_eq!(stored.status, QuoteStatus::Completed);
    assert!(ctx.policies.find_by_quote(second.id).await.unwrap().is_none());
}
