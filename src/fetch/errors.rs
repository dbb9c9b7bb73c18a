// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-item fetch failures

use thiserror::Error;

use crate::vision::DecodeError;

/// A gate that refused an image
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyRejection {
    #[error("Disallowed content type: {0}")]
    DisallowedContentType(String),

    #[error("Declared length {declared} exceeds cap of {max} bytes")]
    DeclaredTooLarge { declared: u64, max: u64 },

    #[error("Body exceeded cap of {max} bytes while streaming")]
    StreamTooLarge { max: u64 },

    #[error("Image {width}x{height} is below the minimum dimension of {min}")]
    Undersized { width: u32, height: u32, min: u32 },

    #[error("Image {width}x{height} exceeds the pixel ceiling")]
    PixelCeiling { width: u32, height: u32 },
}

/// Why one URL did not produce a candidate
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("Rejected: {0}")]
    Rejected(#[from] PolicyRejection),

    #[error("Decode error: {0}")]
    Decode(DecodeError),

    #[error("Fetch cancelled")]
    Cancelled,
}

impl From<DecodeError> for FetchError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::PixelCeiling { width, height, .. } => {
                FetchError::Rejected(PolicyRejection::PixelCeiling { width, height })
            }
            other => FetchError::Decode(other),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl FetchError {
    /// Whether a safety gate, rather than the network or decoder, refused the item
    pub fn is_rejection(&self) -> bool {
        matches!(self, FetchError::Rejected(_))
    }
}
