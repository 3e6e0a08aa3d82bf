// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::quote_workflow::QuoteWorkflow;
use crate::application::use_cases::scrape_use_case::ScrapeUseCase;
use crate::presentation::handlers::{quote_handler, scrape_handler};
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `workflow` - 报价流程
/// * `scrape` - 抓取入队与查询
pub fn routes(workflow: Arc<QuoteWorkflow>, scrape: Arc<ScrapeUseCase>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let api_routes = Router::new()
        .route("/v1/targets", get(scrape_handler::list_targets))
        .route("/v1/scrape/all", post(scrape_handler::scrape_all))
        .route("/v1/scrape/targets/{id}", post(scrape_handler::scrape_target))
        .route("/v1/jobs/dead", get(scrape_handler::dead_jobs))
        .route("/v1/quotes", post(quote_handler::create_quote))
        .route("/v1/quotes/{id}/offers", get(quote_handler::list_offers))
        .route(
            "/v1/quotes/{id}/approve/{offer_id}",
            post(quote_handler::approve_offer),
        )
        .layer(Extension(workflow))
        .layer(Extension(scrape));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
