// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Article markup retrieval and image URL extraction

pub mod extractor;

pub use extractor::{extract_image_urls, normalize_image_url, IMAGE_CDN_HOST};

use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::fetch::config::BROWSER_USER_AGENT;

/// Markup fetch failure
#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("Timed out fetching {0}")]
    Timeout(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

/// Fetches article pages with a browser identity
pub struct ArticleFetcher {
    client: Client,
}

impl ArticleFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, ArticleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .no_proxy()
            .build()
            .map_err(|e| ArticleError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Fetch the page markup. Non-success statuses are errors.
    pub async fn fetch_html(&self, url: &str) -> Result<String, ArticleError> {
        debug!(url = %url, "Fetching article");

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                ArticleError::Timeout(url.to_string())
            } else {
                ArticleError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9")
            .send()
            .await
            .map_err(map_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArticleError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await.map_err(map_err)?;
        info!(url = %url, bytes = html.len(), "Fetched article markup");
        Ok(html)
    }
}
