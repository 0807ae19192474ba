// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 初始化指标系统
///
/// 安装 Prometheus 导出器并注册爬取相关的计数器
///
/// # 参数
///
/// * `addr` - 导出器监听地址
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new();

    // 端口被占用时只告警，不影响爬取
    if let Err(e) = builder.with_http_listener(addr).install() {
        tracing::warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    describe_counter!("tender_pages_total", "Total number of listing pages processed");
    describe_counter!(
        "tender_pages_failed_total",
        "Total number of pages that produced no records"
    );
    describe_counter!(
        "tender_records_crawled_total",
        "Total number of records extracted from pages"
    );
    describe_counter!(
        "tender_records_saved_total",
        "Total number of records acknowledged by the sink"
    );
    describe_counter!(
        "tender_sink_errors_total",
        "Total number of record batches rejected by the sink"
    );
    describe_counter!(
        "tender_sink_fallbacks_total",
        "Total number of batches redirected to the fallback sink"
    );

    info!("Metrics exporter listening on {}", addr);
}
