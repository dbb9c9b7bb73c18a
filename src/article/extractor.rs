// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image URL extraction from article markup

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Host serving article images; only its URLs are canonicalized
pub const IMAGE_CDN_HOST: &str = "mmbiz.qpic.cn";

/// Attributes carrying the real image location, in priority order
const SOURCE_ATTRIBUTES: [&str; 3] = ["data-src", "data-original", "src"];

/// Extract image URLs from article markup
///
/// Looks inside the `#js_content` body when present, else the whole document.
/// Each `<img>` contributes the first non-empty of `data-src`, `data-original`
/// and `src`. URLs are canonicalized and deduplicated in first-seen order.
pub fn extract_image_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let (Ok(container_selector), Ok(img_selector)) =
        (Selector::parse("#js_content"), Selector::parse("img"))
    else {
        return Vec::new();
    };

    let images: Vec<_> = match document.select(&container_selector).next() {
        Some(container) => container.select(&img_selector).collect(),
        None => document.select(&img_selector).collect(),
    };

    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for img in images {
        let source = SOURCE_ATTRIBUTES
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty());

        let Some(source) = source else {
            continue;
        };

        let url = normalize_image_url(source);
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }

    urls
}

/// Canonicalize an image URL for deduplication
///
/// CDN URLs lose their query string and fragment, and a purely numeric last
/// path segment (a resolution) becomes `0`, the original-resolution variant.
/// Protocol-relative URLs are given `https`. Everything else is unchanged.
pub fn normalize_image_url(raw: &str) -> String {
    let absolute = if raw.starts_with("//") {
        format!("https:{}", raw)
    } else {
        raw.to_string()
    };

    let Ok(mut url) = Url::parse(&absolute) else {
        return absolute;
    };
    if url.scheme() != "https" || url.host_str() != Some(IMAGE_CDN_HOST) {
        return absolute;
    }

    url.set_query(None);
    url.set_fragment(None);

    let numeric_tail = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .is_some_and(|last| !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()));

    if numeric_tail {
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop().push("0");
        }
    }

    url.to_string()
}
