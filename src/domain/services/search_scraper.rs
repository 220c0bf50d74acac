// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::models::search_result_row::SearchResultRow;
use crate::domain::services::feed_service::RefreshContext;
use crate::domain::site::adapter::{ScrapeError, SiteAdapter};
use crate::engines::traits::BrowserLauncher;

pub struct SearchScraper {
    launcher: Arc<dyn BrowserLauncher>,
    adapter: Arc<dyn SiteAdapter>,
}

impl SearchScraper {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, adapter: Arc<dyn SiteAdapter>) -> Self {
        Self { launcher, adapter }
    }

    /// 抓取并解析全部搜索结果
    ///
    /// 导航、等待超时或页面结构不符都会使整个阶段失败，不返回部分结果。
    /// 刷新截止时间只约束启动和页面交互，会话在任何情况下都会被关闭。
    pub async fn scrape(&self, ctx: &RefreshContext) -> Result<Vec<SearchResultRow>, ScrapeError> {
        let mut session = within(ctx.deadline, self.launcher.open()).await??;
        debug!(refresh_id = %ctx.id, launcher = self.launcher.name(), "Browser session acquired");

        let page = within(ctx.deadline, self.adapter.fetch_results_page(session.as_mut()))
            .await
            .and_then(|page| page);
        if matches!(page, Err(ScrapeError::Deadline)) {
            warn!(refresh_id = %ctx.id, "Search page interaction hit the refresh deadline");
        }
        session.close().await;

        let rows = self.adapter.parse_result_rows(&page?)?;
        info!(refresh_id = %ctx.id, rows = rows.len(), "Search results scraped");
        Ok(rows)
    }
}

async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Result<F::Output, ScrapeError> {
    match deadline {
        Some(at) => tokio::time::timeout_at(at, fut)
            .await
            .map_err(|_| ScrapeError::Deadline),
        None => Ok(fut.await),
    }
}
