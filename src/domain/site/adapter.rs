// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::search_result_row::SearchResultRow;
use crate::engines::traits::{BrowserSession, EngineError};

/// 站点抓取错误类型
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// 浏览器或网络错误
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// 页面缺少预期元素
    #[error("Expected element `{0}` is missing")]
    MissingElement(&'static str),
    /// 元信息无法拆分为编号、受理日期和状态
    #[error("Malformed metadata for `{title}`: {detail}")]
    MalformedMetadata { title: String, detail: String },
    /// 页面交互未在刷新截止时间前完成
    #[error("Search did not finish before the refresh deadline")]
    Deadline,
}

/// 站点适配器
///
/// 把目标站点相关的页面结构隔离在一个窄接口之后，
/// 便于用保存的 HTML 样本进行单元测试
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// 驱动搜索表单并返回包含全部结果的页面 HTML
    async fn fetch_results_page(
        &self,
        session: &mut dyn BrowserSession,
    ) -> Result<String, ScrapeError>;

    /// 解析结果页中的全部结果行
    ///
    /// 任一行结构不符合预期都会使整个批次失败
    fn parse_result_rows(&self, html: &str) -> Result<Vec<SearchResultRow>, ScrapeError>;

    /// 在文档页中查找 "Application Form" 行的链接
    fn find_application_form_link(&self, html: &str) -> Option<String>;
}

/// 根据首屏结果推算总命中数
///
/// 首屏恰好满一页且存在分页器时返回 `page_size + 1`，表示"至少还有一页"；
/// 满一页但没有分页器时就是 `page_size`；其余情况为实际行数
pub fn compute_hit_count(rows: usize, has_pager: bool, page_size: usize) -> usize {
    if rows == page_size && has_pager {
        page_size + 1
    } else {
        rows
    }
}
