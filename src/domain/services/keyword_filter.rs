// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::search_result_row::SearchResultRow;

/// 标题是否包含任一关键词（不区分大小写的子串匹配）
///
/// 纯空白的关键词被忽略，其余关键词原样匹配（包括首尾空格）
pub fn matches<S: AsRef<str>>(title: &str, terms: &[S]) -> bool {
    let title = title.to_lowercase();
    terms
        .iter()
        .map(AsRef::as_ref)
        .filter(|t| !t.trim().is_empty())
        .any(|t| title.contains(&t.to_lowercase()))
}

/// 保留标题命中关键词的结果行，保持原有顺序
pub fn filter_rows<S: AsRef<str>>(rows: Vec<SearchResultRow>, terms: &[S]) -> Vec<SearchResultRow> {
    rows.into_iter()
        .filter(|row| matches(&row.title, terms))
        .collect()
}
