// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心实体、刷新流程服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 无头浏览器和 HTTP 抓取实现
pub mod engines;

/// 基础设施模块
///
/// 提供缓存文件、站点适配器和指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应
pub mod presentation;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
