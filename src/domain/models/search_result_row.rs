// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 搜索结果行
///
/// 从搜索结果页解析出的一条申请记录。仅在一次刷新周期内存在，
/// 经过关键词过滤和详情抓取后即被丢弃。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultRow {
    /// 申请标题
    pub title: String,
    /// 申请地址
    pub address: String,
    /// 详情页地址（已改写为 documents 页）
    pub url: String,
    /// 申请编号
    pub reference: String,
    /// 受理日期
    pub validated: String,
    /// 当前状态
    pub status: String,
}
