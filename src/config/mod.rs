// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process-wide configuration
//!
//! Loaded once from the environment at startup. Proxy variables are cleared
//! explicitly by [`clear_proxy_env`] before any HTTP client is built.

use std::env;
use std::path::{Path, PathBuf};
use tracing::info;

pub use crate::fetch::FetchConfig;
pub use crate::filter::{FilterConfig, FilterThresholds, InputLayout};

/// Proxy variables removed at startup, in both spellings
pub const PROXY_ENV_VARS: [&str; 6] = [
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "ALL_PROXY",
    "http_proxy",
    "https_proxy",
    "all_proxy",
];

pub const DEFAULT_DISCARD_DIR: &str = "output/discarded";

/// Load `.env` (or the file at `path`) and default `RUST_LOG` to `info`.
///
/// Must run before the tracing subscriber is installed and before CLI
/// arguments are parsed.
pub fn load_env(path: Option<&Path>) {
    match path {
        Some(path) => {
            dotenv::from_path(path).ok();
        }
        None => {
            dotenv::dotenv().ok();
        }
    }
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
}

/// Remove proxy settings from the process environment.
///
/// Returns the names that were set.
pub fn clear_proxy_env() -> Vec<&'static str> {
    let cleared: Vec<&'static str> = PROXY_ENV_VARS
        .iter()
        .copied()
        .filter(|name| env::var_os(name).is_some())
        .collect();
    for name in &cleared {
        env::remove_var(name);
    }
    if !cleared.is_empty() {
        info!(variables = ?cleared, "Cleared proxy environment variables");
    }
    cleared
}

/// Full pipeline and service configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fetch: FetchConfig,
    pub filter: FilterConfig,
    /// Where discarded images go when diagnostics are enabled
    pub discard_dir: PathBuf,
    pub api_host: String,
    pub api_port: u16,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            fetch: FetchConfig::from_env(),
            filter: FilterConfig::from_env(),
            discard_dir: env::var("DISCARD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DISCARD_DIR)),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        self.fetch.validate()?;
        self.filter.validate()?;
        if self.api_host.trim().is_empty() {
            return Err("api_host must not be empty".to_string());
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            filter: FilterConfig::default(),
            discard_dir: PathBuf::from(DEFAULT_DISCARD_DIR),
            api_host: "0.0.0.0".to_string(),
            api_port: 8000,
        }
    }
}
