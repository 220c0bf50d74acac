// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与外部系统的交互。
///
/// 包含的子模块：
/// - 缓存（cache）：缓存记录的 JSON 文件持久化
/// - 可观测性（observability）：Prometheus 指标
/// - 站点（site）：目标站点的页面结构适配
///
/// 基础设施层依赖领域层的抽象接口，领域层不感知具体实现。
pub mod cache;
pub mod observability;
pub mod site;
