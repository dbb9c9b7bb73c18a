// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Convert request types and validation

use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::errors::ApiError;

/// Request to turn an article into a PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    /// Article URL
    pub url: String,

    /// Skip the smart filter and keep every fetched image
    #[serde(default, alias = "disableFilter")]
    pub no_filter: bool,
}

impl ConvertRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ApiError::InvalidRequest("url is required".to_string()));
        }
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
            Ok(parsed) => Err(ApiError::InvalidRequest(format!(
                "unsupported url scheme '{}'",
                parsed.scheme()
            ))),
            Err(e) => Err(ApiError::InvalidRequest(format!("invalid url: {}", e))),
        }
    }
}
