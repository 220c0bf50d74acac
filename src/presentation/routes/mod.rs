// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::feed_handler;
use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `feed_path` - 订阅端点路径
/// * `static_dir` - 其余路径对应的静态文件目录
///
/// # 返回值
///
/// 返回配置好的路由，订阅服务和频道元数据由调用方以 Extension 注入
pub fn routes(feed_path: &str, static_dir: &str) -> Router {
    Router::new()
        .route(feed_path, get(feed_handler::feed))
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
        .fallback_service(ServeDir::new(static_dir))
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
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
