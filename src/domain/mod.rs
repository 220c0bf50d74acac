// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：缓存记录、订阅条目和搜索结果行
/// - 仓库接口（repositories）：缓存持久化抽象接口
/// - 站点接口（site）：目标站点适配器抽象
/// - 服务（services）：刷新流程的各个阶段
///
/// 领域层只依赖抽象接口，不依赖具体的浏览器、HTTP 或文件实现。
pub mod models;
pub mod repositories;
pub mod services;
pub mod site;
