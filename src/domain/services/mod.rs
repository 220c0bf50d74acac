// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 刷新流程的各个阶段：
/// - TTL 判断（ttl_gate）
/// - 搜索抓取（search_scraper）
/// - 关键词过滤（keyword_filter）
/// - 详情抓取（detail_fetcher）
/// - 订阅渲染（feed_renderer）
/// - 流程编排与缓存（feed_service）
pub mod detail_fetcher;
pub mod feed_renderer;
pub mod feed_service;
pub mod keyword_filter;
pub mod search_scraper;
pub mod ttl_gate;
