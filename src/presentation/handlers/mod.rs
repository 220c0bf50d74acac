// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 订阅端点是唯一的业务端点，其余路径由静态文件服务处理
pub mod feed_handler;
