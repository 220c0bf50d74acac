// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::engines::traits::{DocumentFetcher, EngineError};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

/// 详情页抓取引擎
///
/// 基于reqwest实现的基本HTTP抓取引擎，所有详情请求共享一个连接池
pub struct ReqwestEngine {
    client: reqwest::Client,
}

impl ReqwestEngine {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, EngineError> {
        Self::new(&settings.site.user_agent, settings.http_timeout())
    }
}

#[async_trait]
impl DocumentFetcher for ReqwestEngine {
    /// 获取详情页内容
    ///
    /// # 参数
    ///
    /// * `url` - 详情页地址
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 页面 HTML
    /// * `Err(EngineError)` - 网络错误或非 2xx 状态码
    async fn fetch(&self, url: &str) -> Result<String, EngineError> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content = response.text().await?;
        debug!(
            url,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched document page"
        );
        Ok(content)
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
