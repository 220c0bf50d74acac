// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 站点适配模块
///
/// 定义目标站点抓取的接口边界
pub mod adapter;
