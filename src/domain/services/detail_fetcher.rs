// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::stream::{self, StreamExt, TryStreamExt};
use html_escape::{encode_single_quoted_attribute, encode_text};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::models::feed_item::FeedItem;
use crate::domain::models::search_result_row::SearchResultRow;
use crate::domain::services::feed_service::RefreshContext;
use crate::domain::site::adapter::SiteAdapter;
use crate::engines::traits::{DocumentFetcher, EngineError};
use crate::utils::text_processing::collapse_whitespace;
use crate::utils::url_utils::{absolutize, to_summary_url};

const NO_FORM_SENTENCE: &str = " There is currently no Application Form available for this case.";

/// 详情页抓取失败
#[derive(Error, Debug)]
#[error("Document fetch for {url} failed: {source}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub source: EngineError,
}

/// 详情抓取器
///
/// 并发抓取每个命中行的文档页并构建订阅条目。
/// 只有全部成功才返回结果，任一失败即整体失败。
pub struct DetailFetcher {
    fetcher: Arc<dyn DocumentFetcher>,
    adapter: Arc<dyn SiteAdapter>,
    root_url: String,
    display_name: String,
    max_concurrency: usize,
}

impl DetailFetcher {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        adapter: Arc<dyn SiteAdapter>,
        root_url: String,
        display_name: String,
        max_concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            adapter,
            root_url,
            display_name,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// 抓取全部命中行，结果保持输入顺序
    pub async fn fetch_all(
        &self,
        ctx: &RefreshContext,
        rows: Vec<SearchResultRow>,
    ) -> Result<Vec<FeedItem>, FetchError> {
        let total = rows.len();

        let items: Vec<FeedItem> = stream::iter(rows)
            .map(|row| self.fetch_one(row))
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;

        info!(refresh_id = %ctx.id, total, "Document pages fetched");
        Ok(items)
    }

    async fn fetch_one(&self, row: SearchResultRow) -> Result<FeedItem, FetchError> {
        let url = absolutize(&row.url, &self.root_url);
        let html = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|source| FetchError {
                url: url.clone(),
                source,
            })?;

        let form_available = self.adapter.find_application_form_link(&html).is_some();
        debug!(url = %url, form_available, "Parsed document page");

        Ok(build_feed_item(
            &row,
            form_available,
            &self.root_url,
            &self.display_name,
        ))
    }
}

/// 构建订阅条目
///
/// 有申请表时链接指向文档页，否则退回摘要页；以 `/` 开头的链接补全为绝对地址
pub fn build_feed_item(
    row: &SearchResultRow,
    form_available: bool,
    root_url: &str,
    display_name: &str,
) -> FeedItem {
    let summary_url = absolutize(&to_summary_url(&row.url), root_url);
    let link = if form_available {
        absolutize(&row.url, root_url)
    } else {
        summary_url.clone()
    };

    let description = describe(row, &summary_url, form_available, display_name);
    FeedItem::new(row.title.clone(), link, description)
}

fn describe(
    row: &SearchResultRow,
    summary_url: &str,
    form_available: bool,
    display_name: &str,
) -> String {
    let field = |value: &str| encode_text(&collapse_whitespace(value)).into_owned();

    let mut description = format!(
        "<p><b>Address</b>: {}</p><p><b>Status</b>: {}</p><p><b>Ref</b>: {}</p>\
         <p><b>Validated</b>: {}</p><p>For full details on this application, see the \
         <a href='{}'>{}</a>.",
        field(&row.address),
        field(&row.status),
        field(&row.reference),
        field(&row.validated),
        encode_single_quoted_attribute(summary_url),
        encode_text(display_name),
    );
    if !form_available {
        description.push_str(NO_FORM_SENTENCE);
    }
    description.push_str("</p>");
    description
}
