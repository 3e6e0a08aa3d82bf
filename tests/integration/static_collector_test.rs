// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{fast_scraper_settings, TestContext};
use quotrs::engines::static_collector::StaticCollector;
use quotrs::engines::traits::{EngineError, TargetScraper};
use quotrs::utils::robots::{RobotsChecker, RobotsPolicy};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = r#"
<html>
  <body>
    <h1>Kasko Sigortası</h1>
    <p class="content">Aracınız için kapsamlı güvence.</p>
    <span class="premium">1.425,00 TL</span>
    <a href="/iletisim">İletişim</a>
  </body>
</html>
"#;

async fn serve_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(server)
        .await;
}

fn collector(ctx: &TestContext) -> StaticCollector {
    StaticCollector::new(&fast_scraper_settings(), ctx.rows.clone()).unwrap()
}

#[tokio::test]
async fn test_rescrape_does_not_duplicate_rows() {
    let server = MockServer::start().await;
    serve_page(&server).await;
    let ctx = TestContext::new().await;
    let target = ctx.add_target("Kasko Sayfası", &server.uri()).await;
    let collector = collector(&ctx);

    let first = collector.scrape_target(&target).await.unwrap();
    assert_eq!(first.total_pages, 1);
    assert_eq!(first.success_pages, 1);
    assert_eq!(first.data_extracted, 1);

    let second = collector.scrape_target(&target).await.unwrap();
    assert_eq!(second.success_pages, 1);
    assert_eq!(second.data_extracted, 0);

    assert_eq!(ctx.rows.count_by_target(target.id).await.unwrap(), 1);
    let rows = ctx.rows.list_by_target(target.id).await.unwrap();
    assert_eq!(rows[0].row_type, "default");
    assert_eq!(rows[0].raw["title"], json!("Kasko Sigortası"));
}

#[tokio::test]
async fn test_custom_selectors_take_precedence() {
    let server = MockServer::start().await;
    serve_page(&server).await;
    let ctx = TestContext::new().await;
    let mut target = ctx.add_target("Kasko Sayfası", &server.uri()).await;
    target.selector_json = Some(json!({"premium": ".premium", "heading": "h1"}));
    let target = ctx.targets.update(&target).await.unwrap();

    let stats = collector(&ctx).scrape_target(&target).await.unwrap();
    assert_eq!(stats.data_extracted, 1);

    let rows = ctx.rows.list_by_target(target.id).await.unwrap();
    assert_eq!(rows[0].row_type, "custom");
    assert_eq!(rows[0].raw["premium"], json!("1.425,00 TL"));
    assert_eq!(rows[0].raw["heading"], json!("Kasko Sigortası"));
    assert!(!rows[0].raw.contains_key("title"));
}

#[tokio::test]
async fn test_robots_disallow_is_permanent_failure() {
    let server = MockServer::start().await;
    serve_page(&server).await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
        .mount(&server)
        .await;

    let ctx = TestContext::new().await;
    let target = ctx.add_target("Kasko Sayfası", &server.uri()).await;
    let robots: Arc<dyn RobotsPolicy> = Arc::new(RobotsChecker::new(Client::new(), "quotrs-test"));
    let collector = collector(&ctx).with_robots(Some(robots));

    let failure = collector.scrape_target(&target).await.unwrap_err();
    assert!(matches!(failure.error, EngineError::Disallowed(_)));
    assert!(!failure.error.is_retryable());
    assert_eq!(failure.stats.total_pages, 0);
    assert_eq!(ctx.rows.count_by_target(target.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_server_error_is_retryable_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let ctx = TestContext::new().await;
    let target = ctx.add_target("Kasko Sayfası", &server.uri()).await;

    let failure = collector(&ctx).scrape_target(&target).await.unwrap_err();
    assert_eq!(failure.stats.total_pages, 1);
    assert_eq!(failure.stats.error_pages, 1);
    assert!(failure.error.is_retryable());
}
