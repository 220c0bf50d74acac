// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 订阅条目
///
/// 一条可发布的 RSS 条目，由详情抓取阶段生成，最终写入缓存记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    /// 条目链接
    pub link: String,
    /// 条目标题
    pub title: String,
    /// 预渲染的 HTML 描述片段
    pub description: String,
    /// 基于标题的稳定标识
    pub guid: String,
}

impl FeedItem {
    /// 创建订阅条目，guid 由标题计算得出
    pub fn new(title: String, link: String, description: String) -> Self {
        let guid = title_guid(&title);
        Self {
            link,
            title,
            description,
            guid,
        }
    }
}

/// 计算标题的十六进制 SHA-256 摘要
///
/// 相同标题在不同刷新周期中得到相同的 guid，供阅读器去重
pub fn title_guid(title: &str) -> String {
    hex::encode(Sha256::digest(title.as_bytes()))
}
