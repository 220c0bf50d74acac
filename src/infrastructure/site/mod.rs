// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 站点适配器实现
///
/// 目前只支持 Idox 公共查询门户
pub mod idox;
