// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::DateTime;
use std::borrow::Cow;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::config::settings::Settings;
use crate::domain::models::cache_record::CacheRecord;

pub const CONTENT_TYPE: &str = "text/xml";

/// 频道图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedImage {
    pub url: String,
    pub title: String,
    pub link: String,
}

/// 频道元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMetadata {
    pub title: String,
    pub description: String,
    pub link: String,
    pub ttl_minutes: u64,
    pub image: Option<FeedImage>,
}

impl FeedMetadata {
    /// 由配置构建，图片地址在此处一次性补全为绝对地址
    pub fn from_settings(settings: &Settings) -> Self {
        let image = settings
            .feed
            .image
            .as_ref()
            .zip(settings.feed_image_url())
            .map(|(image, url)| FeedImage {
                url,
                title: image
                    .title
                    .clone()
                    .unwrap_or_else(|| settings.feed.title.clone()),
                link: image
                    .link
                    .clone()
                    .unwrap_or_else(|| settings.feed.link.clone()),
            });

        Self {
            title: settings.feed.title.clone(),
            description: settings.feed.description.clone(),
            link: settings.feed.link.clone(),
            ttl_minutes: settings.feed.ttl_minutes,
            image,
        }
    }
}

/// 渲染 RSS 2.0 文档
///
/// 相同输入总是得到相同输出。`self_url` 为本次请求的完整地址，
/// 写入 `atom:link rel="self"`。
pub fn render_feed(metadata: &FeedMetadata, self_url: &str, record: &CacheRecord) -> String {
    let mut xml = String::with_capacity(1024 + record.rssitems.len() * 512);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    xml.push_str("<channel>\n");
    push_element(&mut xml, "title", &metadata.title);
    push_element(&mut xml, "link", &metadata.link);
    xml.push_str(&format!(
        "<atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        encode_double_quoted_attribute(&xml_chars(self_url))
    ));
    push_element(&mut xml, "description", &metadata.description);
    push_element(&mut xml, "ttl", &metadata.ttl_minutes.to_string());

    if let Some(built) = record
        .last_cache
        .and_then(DateTime::from_timestamp_millis)
    {
        push_element(&mut xml, "lastBuildDate", &built.to_rfc2822());
    }

    if let Some(image) = &metadata.image {
        xml.push_str("<image>\n");
        push_element(&mut xml, "url", &image.url);
        push_element(&mut xml, "title", &image.title);
        push_element(&mut xml, "link", &image.link);
        xml.push_str("</image>\n");
    }

    for item in &record.rssitems {
        xml.push_str("<item>\n");
        push_element(&mut xml, "title", &item.title);
        push_element(&mut xml, "link", &item.link);
        push_element(&mut xml, "description", &item.description);
        xml.push_str(&format!(
            "<guid isPermaLink=\"false\">{}</guid>\n",
            encode_text(&xml_chars(&item.guid))
        ));
        xml.push_str("</item>\n");
    }

    xml.push_str("</channel>\n</rss>\n");
    xml
}

fn push_element(xml: &mut String, name: &str, text: &str) {
    xml.push('<');
    xml.push_str(name);
    xml.push('>');
    xml.push_str(&encode_text(&xml_chars(text)));
    xml.push_str("</");
    xml.push_str(name);
    xml.push_str(">\n");
}

/// 去掉 XML 1.0 不允许出现的字符
fn xml_chars(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\u{9}'
            | '\u{A}'
            | '\u{D}'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}
