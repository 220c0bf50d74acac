// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, OriginalUri},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

use crate::domain::services::feed_renderer::{render_feed, FeedMetadata, CONTENT_TYPE};
use crate::domain::services::feed_service::FeedService;
use crate::utils::telemetry::now_for_log;

/// 处理订阅请求
///
/// 缓存新鲜时直接返回，否则先尝试刷新。抓取错误不会暴露给订阅方，
/// 最差情况下返回旧的或空的订阅。
///
/// # 参数
///
/// * `service` - 订阅服务
/// * `metadata` - 频道元数据
/// * `headers` - 请求头，用于还原完整请求地址
/// * `uri` - 原始请求路径
pub async fn feed(
    Extension(service): Extension<Arc<FeedService>>,
    Extension(metadata): Extension<Arc<FeedMetadata>>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
) -> impl IntoResponse {
    let snapshot = service.feed().await;
    let self_url = request_url(&headers, &uri.to_string());

    info!(
        source = snapshot.source.as_str(),
        items = snapshot.record.rssitems.len(),
        "Replying to RSS feed request @ {}",
        now_for_log()
    );

    let body = render_feed(&metadata, &self_url, &snapshot.record);
    (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body)
}

/// 由 Host 和 X-Forwarded-Proto 还原完整请求地址
pub fn request_url(headers: &HeaderMap, path_and_query: &str) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{}://{}{}", scheme, host, path_and_query)
}
