// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::config::settings::Settings;
use crate::domain::models::search_result_row::SearchResultRow;
use crate::domain::site::adapter::{compute_hit_count, ScrapeError, SiteAdapter};
use crate::engines::traits::BrowserSession;
use crate::utils::text_processing::collapse_whitespace;
use crate::utils::url_utils::{resolve_href, to_documents_url};

const SEARCH_BUTTON: &str = "input.button.primary";
const RESULTS_CONTAINER: &str = "#searchresults";
const RESULTS_PER_PAGE: &str = "#resultsPerPage";
const APPLICATION_FORM: &str = "Application Form";

static RESULT_ROW: Lazy<Selector> = Lazy::new(|| selector(".searchresult"));
static PAGER: Lazy<Selector> = Lazy::new(|| selector(".pager"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));
static ADDRESS: Lazy<Selector> = Lazy::new(|| selector(".address"));
static META_INFO: Lazy<Selector> = Lazy::new(|| selector(".metaInfo"));
static TABLE_CELL: Lazy<Selector> = Lazy::new(|| selector("td"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Failed to compile selector")
}

/// Idox 公共查询门户适配器
///
/// 英国多数地方议会的规划申请检索使用该门户。结果页每行形如：
///
/// ```html
/// <li class="searchresult">
///   <a href="/online-applications/applicationDetails.do?activeTab=summary&keyVal=X">Title</a>
///   <p class="address">1 Main St</p>
///   <p class="metaInfo">Ref. No: PA20/00001 <span class="divider">|</span>
///     Validated: Mon 06 Jan 2020 <span class="divider">|</span> Status: Pending</p>
/// </li>
/// ```
pub struct IdoxAdapter {
    search_url: String,
    page_size: usize,
    results_per_page: usize,
}

impl IdoxAdapter {
    pub fn new(search_url: String, page_size: usize, results_per_page: usize) -> Self {
        Self {
            search_url,
            page_size,
            results_per_page,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.site.search_url.clone(),
            settings.site.page_size,
            settings.site.results_per_page,
        )
    }

    /// 根据首屏结果推算命中数
    pub fn count_hits(&self, html: &str) -> usize {
        let document = Html::parse_document(html);
        let rows = document.select(&RESULT_ROW).count();
        let has_pager = document.select(&PAGER).next().is_some();
        compute_hit_count(rows, has_pager, self.page_size)
    }

    /// 解析单个结果行
    pub fn parse_result_row(&self, row: ElementRef<'_>) -> Result<SearchResultRow, ScrapeError> {
        let anchor = row
            .select(&ANCHOR)
            .next()
            .ok_or(ScrapeError::MissingElement("a"))?;
        let href = anchor
            .value()
            .attr("href")
            .ok_or(ScrapeError::MissingElement("a[href]"))?;
        let title = collapse_whitespace(&element_text(anchor)).trim().to_string();

        let address = row
            .select(&ADDRESS)
            .next()
            .map(element_text)
            .ok_or(ScrapeError::MissingElement(".address"))?;

        let meta = row
            .select(&META_INFO)
            .next()
            .ok_or(ScrapeError::MissingElement(".metaInfo"))?;
        let segments = split_meta_segments(meta);
        if segments.len() < 3 {
            return Err(ScrapeError::MalformedMetadata {
                title,
                detail: format!("expected 3 segments, found {}", segments.len()),
            });
        }

        let reference = meta_value(&title, &segments[0])?;
        let validated = meta_value(&title, &segments[1])?;
        let status = meta_value(&title, &segments[2])?;

        Ok(SearchResultRow {
            url: to_documents_url(&resolve_href(&self.search_url, href)),
            title,
            address: address.trim().to_string(),
            reference,
            validated,
            status,
        })
    }
}

#[async_trait]
impl SiteAdapter for IdoxAdapter {
    async fn fetch_results_page(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<String, ScrapeError> {
        session.goto(&self.search_url).await?;
        session.wait_for(SEARCH_BUTTON).await?;
        session.click(SEARCH_BUTTON).await?;
        session.wait_for(RESULTS_CONTAINER).await?;

        let first_page = session.content().await?;
        let hits = self.count_hits(&first_page);
        info!(hits, "Inspected initial search results");

        if hits == 0 {
            return Ok(first_page);
        }

        session
            .select_option(RESULTS_PER_PAGE, &self.results_per_page.to_string())
            .await?;
        session.click(SEARCH_BUTTON).await?;
        session
            .wait_for(&format!(".searchresult:nth-child({})", hits))
            .await?;

        Ok(session.content().await?)
    }

    fn parse_result_rows(&self, html: &str) -> Result<Vec<SearchResultRow>, ScrapeError> {
        let document = Html::parse_document(html);
        let rows = document
            .select(&RESULT_ROW)
            .map(|row| self.parse_result_row(row))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rows = rows.len(), "Parsed search result rows");
        Ok(rows)
    }

    fn find_application_form_link(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        document
            .select(&TABLE_CELL)
            .filter(|cell| element_text(*cell).trim() == APPLICATION_FORM)
            .filter_map(|cell| {
                cell.ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|el| el.value().name() == "tr")
            })
            .find_map(|row| {
                row.select(&LINK)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string)
            })
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

// Splits the metadata block on its divider spans, keeping nested markup as text.
fn split_meta_segments(meta: ElementRef<'_>) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for node in meta.children() {
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().classes().any(|c| c == "divider") {
                segments.push(std::mem::take(&mut current));
            } else {
                current.push_str(&element_text(el));
            }
        } else if let Some(text) = node.value().as_text() {
            current.push_str(text);
        }
    }
    segments.push(current);
    segments
}

fn meta_value(title: &str, segment: &str) -> Result<String, ScrapeError> {
    segment
        .split_once(':')
        .map(|(_, value)| value.trim().to_string())
        .ok_or_else(|| ScrapeError::MalformedMetadata {
            title: title.to_string(),
            detail: format!("segment `{}` has no label", segment.trim()),
        })
}

#[cfg(test)]
#[path = "idox_test.rs"]
mod tests;
