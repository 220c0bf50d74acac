// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

use crate::config::settings::MetricsSettings;

pub const FEED_REQUESTS_TOTAL: &str = "feed_requests_total";
pub const FEED_REFRESH_TOTAL: &str = "feed_refresh_total";
pub const FEED_REFRESH_FAILED_TOTAL: &str = "feed_refresh_failed_total";
pub const FEED_REFRESH_DURATION_SECONDS: &str = "feed_refresh_duration_seconds";
pub const FEED_ITEMS_PUBLISHED: &str = "feed_items_published";

/// 初始化指标系统
///
/// 未启用时不安装导出器，指标宏退化为空操作
pub fn init_metrics(settings: &MetricsSettings) -> anyhow::Result<()> {
    if !settings.enabled {
        return Ok(());
    }

    let addr: SocketAddr = settings.listen.parse()?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!("Prometheus exporter listening on {}", addr);

    describe_counter!(
        FEED_REQUESTS_TOTAL,
        "Feed requests served, labelled by source (cache, refresh, stale)"
    );
    describe_counter!(FEED_REFRESH_TOTAL, "Successful refresh cycles");
    describe_counter!(
        FEED_REFRESH_FAILED_TOTAL,
        "Failed refresh cycles, labelled by stage"
    );
    describe_histogram!(
        FEED_REFRESH_DURATION_SECONDS,
        "Duration of refresh cycles in seconds"
    );
    describe_gauge!(FEED_ITEMS_PUBLISHED, "Number of items in the current feed");

    Ok(())
}
