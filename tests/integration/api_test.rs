// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{fast_scraper_settings, TestContext, COMPANIES};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use quotrs::application::use_cases::quote_workflow::QuoteWorkflow;
use quotrs::application::use_cases::scrape_use_case::ScrapeUseCase;
use quotrs::engines::quote_fetcher::SimulatedQuoteFetcher;
use quotrs::presentation::routes::routes;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use uuid::Uuid;

fn app(ctx: &TestContext) -> (Router, Arc<QuoteWorkflow>) {
    let workflow = Arc::new(QuoteWorkflow::new(
        ctx.customers.clone(),
        ctx.quotes.clone(),
        ctx.targets.clone(),
        ctx.scheduler.clone(),
        Duration::ZERO,
    ));
    let scrape = Arc::new(ScrapeUseCase::new(ctx.targets.clone(), ctx.scheduler.clone()));
    (routes(workflow.clone(), scrape), workflow)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await;
    let (app, _) = app(&ctx);
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));
}

#[tokio::test]
async fn test_create_quote_for_unknown_customer_is_not_found() {
    let ctx = TestContext::new().await;
    let (app, _) = app(&ctx);
    let (status, body) = send(
        &app,
        "POST",
        "/v1/quotes",
        Some(json!({"customer_id": Uuid::new_v4()})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("customer"));
}

#[tokio::test]
async fn test_invalid_vehicle_year_is_bad_request() {
    let ctx = TestContext::new().await;
    let customer = ctx.add_customer().await;
    let (app, _) = app(&ctx);
    let (status, _) = send(
        &app,
        "POST",
        "/v1/quotes",
        Some(json!({"customer_id": customer.id, "vehicle_year": 1900})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quote_lifecycle_over_http() {
    let ctx = TestContext::new().await;
    for company in COMPANIES {
        ctx.add_target(company, "https://example.com").await;
    }
    let customer = ctx.add_customer().await;
    let (app, workflow) = app(&ctx);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/quotes",
        Some(json!({"customer_id": customer.id, "vehicle_plate": "06XYZ42"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "pending");
    let quote_id: Uuid = body["id"].as_str().unwrap().parse().unwrap();

    workflow
        .scrape_quote(quote_id, &SimulatedQuoteFetcher::new(&fast_scraper_settings()))
        .await
        .unwrap();

    let (status, body) = send(&app, "GET", &format!("/v1/quotes/{}/offers", quote_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 5);
    assert_eq!(offers[0]["company_name"], "Allianz");
    let offer_id = offers[0]["id"].as_str().unwrap().to_string();

    let uri = format!("/v1/quotes/{}/approve/{}", quote_id, offer_id);
    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["company_name"], "Allianz");
    assert_eq!(body["premium"], 1282.5);

    let (status, _) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_offers_for_unknown_quote_is_not_found() {
    let ctx = TestContext::new().await;
    let (app, _) = app(&ctx);
    let uri = format!("/v1/quotes/{}/offers", Uuid::new_v4());
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scrape_endpoints() {
    let ctx = TestContext::new().await;
    let target = ctx.add_target("Allianz", "https://www.allianz.com.tr").await;
    let (app, _) = app(&ctx);

    let (status, body) = send(&app, "GET", "/v1/targets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "POST", "/v1/scrape/all", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["job_type"], "scrape:all");

    let uri = format!("/v1/scrape/targets/{}", target.id);
    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["job_type"], "scrape:target");

    let uri = format!("/v1/scrape/targets/{}", Uuid::new_v4());
    let (status, _) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dead_jobs_limit_is_validated() {
    let ctx = TestContext::new().await;
    let (app, _) = app(&ctx);

    let (status, _) = send(&app, "GET", "/v1/jobs/dead?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/v1/jobs/dead", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}
