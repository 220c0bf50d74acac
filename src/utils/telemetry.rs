// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Local, TimeZone};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,planfeed=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 本地时间的 `YYYY-MM-DD HH:MM:SS` 表示，用于日志
pub fn log_datetime<Tz: TimeZone>(at: DateTime<Tz>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 当前本地时间的日志时间戳
pub fn now_for_log() -> String {
    log_datetime(Local::now())
}
