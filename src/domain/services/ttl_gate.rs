// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;

/// 时钟
///
/// 以 Unix 毫秒表示当前时间，测试中可替换为固定时钟
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// 系统时钟
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// 判断缓存是否仍然新鲜
///
/// 当且仅当 `last_refresh + ttl > now` 时为新鲜；没有刷新记录视为 0
pub fn is_fresh(now_ms: i64, last_refresh_ms: Option<i64>, ttl_minutes: u64) -> bool {
    let last = last_refresh_ms.unwrap_or(0);
    let ttl_ms = i64::try_from(ttl_minutes)
        .unwrap_or(i64::MAX)
        .saturating_mul(60_000);
    last.saturating_add(ttl_ms) > now_ms
}
