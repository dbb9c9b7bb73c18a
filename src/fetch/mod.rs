// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Admission-gated image fetching
//!
//! Turns a list of image URLs into decoded [`Candidate`]s under a concurrency
//! ceiling, a per-item byte cap, a pixel ceiling and a minimum size.

pub mod config;
pub mod errors;
pub mod fetcher;

pub use config::FetchConfig;
pub use errors::{FetchError, PolicyRejection};
pub use fetcher::{is_disallowed_content_type, Candidate, ImageFetcher};
