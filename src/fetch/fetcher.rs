// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Admission-gated image fetching
//!
//! Every URL goes through the same gates, in order:
//! 1. one of `max_concurrent_downloads` admission slots
//! 2. HTTP status
//! 3. declared content type (markup and vector graphics are refused)
//! 4. declared content length against the byte cap
//! 5. streamed body size against the byte cap
//! 6. bounded decode (pixel ceiling) and RGB normalization
//! 7. minimum width and height

use anyhow::{Context, Result};
use futures::future::join_all;
use futures::StreamExt;
use image::RgbImage;
use reqwest::header::{ACCEPT, CONTENT_TYPE, REFERER};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::{FetchConfig, IMAGE_ACCEPT};
use super::errors::{FetchError, PolicyRejection};
use crate::vision::{decode_image_bytes, ImageInfo};

/// An image that passed every fetch gate
#[derive(Debug, Clone)]
pub struct Candidate {
    pub image: RgbImage,
    /// Size of the encoded payload
    pub size_bytes: usize,
    pub url: String,
}

impl Candidate {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Content types refused before any body is read
pub fn is_disallowed_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("image/svg")
}

/// Decode a downloaded body unless its batch was cancelled meanwhile
fn decode_unless_cancelled(
    body: &[u8],
    max_pixels: u64,
    cancel: &CancellationToken,
) -> Result<(RgbImage, ImageInfo), FetchError> {
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    Ok(decode_image_bytes(body, max_pixels)?)
}

/// Bounded-concurrency image fetcher
///
/// Holds only the HTTP client and limits. Every batch gets its own admission
/// gate, so concurrent batches never compete for slots.
pub struct ImageFetcher {
    client: Client,
    config: FetchConfig,
}

impl ImageFetcher {
    /// Create a fetcher. The client never consults proxy settings.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .no_proxy()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch, decode and gate a single image
    pub async fn fetch_one(&self, url: &str) -> Result<Candidate, FetchError> {
        let gate = Arc::new(Semaphore::new(1));
        self.fetch_admitted(url, &gate, &CancellationToken::new())
            .await
    }

    /// Fetch one URL once a slot of `gate` is free
    ///
    /// The slot is held until decoding ends, including a decode that is
    /// still running on the blocking pool after the fetch was cancelled.
    async fn fetch_admitted(
        &self,
        url: &str,
        gate: &Arc<Semaphore>,
        cancel: &CancellationToken,
    ) -> Result<Candidate, FetchError> {
        let permit = gate
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| FetchError::Cancelled)?;

        let body = self.download(url).await?;
        let size_bytes = body.len();

        let max_pixels = self.config.max_image_pixels;
        let cancel = cancel.clone();
        let (image, info) = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            decode_unless_cancelled(&body, max_pixels, &cancel)
        })
        .await
        .map_err(|e| FetchError::Network(format!("Decode task failed: {}", e)))??;

        let min = self.config.min_image_dimension;
        if info.width < min || info.height < min {
            return Err(PolicyRejection::Undersized {
                width: info.width,
                height: info.height,
                min,
            }
            .into());
        }

        debug!(
            url = %url,
            width = info.width,
            height = info.height,
            format = ?info.format,
            size_bytes,
            "Image fetched"
        );

        Ok(Candidate {
            image,
            size_bytes,
            url: url.to_string(),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .header(REFERER, &self.config.referer)
            .header(ACCEPT, IMAGE_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if is_disallowed_content_type(&content_type) {
            return Err(PolicyRejection::DisallowedContentType(content_type).into());
        }

        let max = self.config.max_image_size_bytes;
        let declared = response.content_length();
        if let Some(declared) = declared {
            if declared > max {
                return Err(PolicyRejection::DeclaredTooLarge { declared, max }.into());
            }
        }

        let mut body = Vec::with_capacity(declared.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if (body.len() + chunk.len()) as u64 > max {
                return Err(PolicyRejection::StreamTooLarge { max }.into());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    /// Fetch every URL concurrently, at most `max_concurrent_downloads` at once
    ///
    /// Results are returned in the same order as `urls`. One failure never
    /// stops the others. Cancelling `cancel` aborts pending and in-flight
    /// fetches, which report [`FetchError::Cancelled`]. A decode already
    /// running keeps its slot until it returns; queued decodes are skipped.
    pub async fn fetch_all(
        &self,
        urls: &[String],
        cancel: &CancellationToken,
    ) -> Vec<Result<Candidate, FetchError>> {
        let gate = Arc::new(Semaphore::new(self.config.max_concurrent_downloads));
        let gate = &gate;
        let futures = urls.iter().map(|url| async move {
            tokio::select! {
                _ = cancel.cancelled() => Err(FetchError::Cancelled),
                result = self.fetch_admitted(url, gate, cancel) => result,
            }
        });
        join_all(futures).await
    }

    /// Fetch every URL and keep only the successes, in input order
    pub async fn fetch_candidates(
        &self,
        urls: &[String],
        cancel: &CancellationToken,
    ) -> Vec<Candidate> {
        let results = self.fetch_all(urls, cancel).await;
        results
            .into_iter()
            .zip(urls)
            .filter_map(|(result, url)| match result {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    warn!(url = %url, error = %e, "Skipping image");
                    None
                }
            })
            .collect()
    }
}
