// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    /// Same text as `message`, under the key browser clients read
    pub detail: String,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    ArticleFetchFailed(String),
    NoImageUrls,
    NoImagesFetched(String),
    AllFiltered(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone()),
            ApiError::ArticleFetchFailed(msg) => (
                "article_fetch_failed",
                format!("Failed to fetch article content: {}", msg),
            ),
            ApiError::NoImageUrls => (
                "no_image_urls",
                "No image links found in the article".to_string(),
            ),
            ApiError::NoImagesFetched(msg) => ("no_images_fetched", msg.clone()),
            ApiError::AllFiltered(msg) => (
                "all_filtered",
                format!("No valid images to build a PDF (all filtered out): {}", msg),
            ),
            ApiError::InternalError(msg) => ("internal_error", msg.clone()),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            detail: message.clone(),
            message,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::ArticleFetchFailed(_)
            | ApiError::NoImageUrls
            | ApiError::NoImagesFetched(_)
            | ApiError::AllFiltered(_) => 400,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_response().message)
    }
}

impl std::error::Error for ApiError {}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::ArticleFetch(e) => ApiError::ArticleFetchFailed(e.to_string()),
            PipelineError::NoImageUrls => ApiError::NoImageUrls,
            e @ PipelineError::NoImagesFetched(_) => ApiError::NoImagesFetched(e.to_string()),
            e @ PipelineError::AllFiltered(_) => ApiError::AllFiltered(e.to_string()),
            e @ (PipelineError::Compose(_)
            | PipelineError::Cancelled
            | PipelineError::Internal(_)) => ApiError::InternalError(e.to_string()),
        }
    }
}
