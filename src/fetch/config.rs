// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for image fetching
//!
//! Admission gate size, per-item limits and the request identity sent to
//! image hosts.

use std::env;

/// Desktop browser identity; image CDNs refuse obvious bots
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_REFERER: &str = "https://mp.weixin.qq.com/";

pub const IMAGE_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";

/// Configuration for the admission-gated fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Maximum simultaneous in-flight fetches (default: 10)
    pub max_concurrent_downloads: usize,
    /// Wall-clock timeout per request in seconds (default: 20)
    pub request_timeout_secs: u64,
    /// Byte cap per image, declared or streamed (default: 10 MiB)
    pub max_image_size_bytes: u64,
    /// Decoded pixel-count ceiling (default: 100 * 1024 * 1024)
    pub max_image_pixels: u64,
    /// Minimum width and height of an accepted image (default: 300)
    pub min_image_dimension: u32,
    /// Referer header sent with every image request
    pub referer: String,
    pub user_agent: String,
}

impl FetchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_downloads: env::var("MAX_CONCURRENT_DOWNLOADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_concurrent_downloads),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            max_image_size_bytes: env::var("MAX_IMAGE_SIZE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_image_size_bytes),
            max_image_pixels: env::var("MAX_IMAGE_PIXELS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_image_pixels),
            min_image_dimension: env::var("MIN_IMAGE_DIMENSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_image_dimension),
            referer: env::var("IMAGE_REFERER").unwrap_or(defaults.referer),
            user_agent: defaults.user_agent,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_downloads == 0 {
            return Err("max_concurrent_downloads must be at least 1".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be at least 1".to_string());
        }
        if self.max_image_size_bytes == 0 {
            return Err("max_image_size_bytes must be at least 1".to_string());
        }
        if self.max_image_pixels == 0 {
            return Err("max_image_pixels must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 10,
            request_timeout_secs: 20,
            max_image_size_bytes: 10 * 1024 * 1024,
            max_image_pixels: 100 * 1024 * 1024,
            min_image_dimension: 300,
            referer: DEFAULT_REFERER.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}
