// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::models::feed_item::FeedItem;

/// 缓存记录
///
/// 唯一的持久化状态。每次成功刷新都会整体替换 `rssitems`，
/// `lastCache` 为上次成功刷新的毫秒时间戳。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// 上次成功刷新时间（Unix 毫秒），缺失或无法解析时为 `None`
    #[serde(
        rename = "lastCache",
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_cache: Option<i64>,
    /// 订阅条目
    #[serde(default)]
    pub rssitems: Vec<FeedItem>,
}

impl CacheRecord {
    /// 冷启动使用的空记录
    pub fn empty() -> Self {
        Self::default()
    }

    /// 由一次成功刷新得到的新记录
    ///
    /// `lastCache` 取 `max(now, previous)`，保证单调不减
    pub fn refreshed(now_ms: i64, previous: Option<i64>, rssitems: Vec<FeedItem>) -> Self {
        let last_cache = previous.map_or(now_ms, |prev| prev.max(now_ms));
        Self {
            last_cache: Some(last_cache),
            rssitems,
        }
    }
}

// Accepts numbers, numeric strings and garbage alike; anything unusable becomes None.
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_leading_integer(&s),
        _ => None,
    }))
}

fn parse_leading_integer(s: &str) -> Option<i64> {
    let trimmed = s.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}
