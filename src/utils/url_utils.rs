// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

const SUMMARY: &str = "summary";
const DOCUMENTS: &str = "documents";

/// 将申请摘要页地址改写为文档页地址
///
/// 替换第一个 `summary`，已是文档页的地址保持不变
pub fn to_documents_url(url: &str) -> String {
    url.replacen(SUMMARY, DOCUMENTS, 1)
}

/// 将文档页地址还原为申请摘要页地址
pub fn to_summary_url(url: &str) -> String {
    url.replacen(DOCUMENTS, SUMMARY, 1)
}

/// 以 `/` 开头的相对路径加上站点根地址
pub fn absolutize(link: &str, root_url: &str) -> String {
    if link.starts_with('/') {
        format!("{}{}", root_url.trim_end_matches('/'), link)
    } else {
        link.to_string()
    }
}

/// 按页面地址解析 href，行为与浏览器的 `anchor.href` 一致
///
/// 页面地址本身无法解析时原样返回 href
pub fn resolve_href(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}
