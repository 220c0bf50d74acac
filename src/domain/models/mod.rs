// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 缓存记录（cache_record）：唯一的持久化状态
/// - 订阅条目（feed_item）：一条可发布的 RSS 条目
/// - 搜索结果行（search_result_row）：刷新周期内的临时抓取结果
pub mod cache_record;
pub mod feed_item;
pub mod search_result_row;
