// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 安装 Prometheus 指标导出器
///
/// 地址无法解析或端口被占用时只记录警告，不影响主流程
pub fn init_metrics(listen_addr: &str) {
    let addr: SocketAddr = match listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address '{}': {}", listen_addr, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }

    describe_metrics();
    info!("Metrics exporter listening on {}", addr);
}

fn describe_metrics() {
    describe_counter!("jobs_enqueued_total", "Jobs submitted to the orchestrator");
    describe_counter!("jobs_completed_total", "Jobs whose handler succeeded");
    describe_counter!("jobs_failed_total", "Handler failures, retried or not");
    describe_counter!("jobs_dead_total", "Jobs moved to the dead letter");
    describe_counter!("scrape_pages_total", "Pages visited by the collectors");
    describe_counter!("scraped_rows_inserted_total", "New content-addressed rows");
    describe_counter!("quote_offers_total", "Offers produced per source");
}
