// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod article;
pub mod cli;
pub mod compose;
pub mod config;
pub mod fetch;
pub mod filter;
pub mod pipeline;
pub mod vision;

// Re-export main types
pub use article::{extract_image_urls, normalize_image_url, ArticleError, ArticleFetcher};
pub use compose::{compose_pdf, save_pdf, ComposeError};
pub use config::{clear_proxy_env, PipelineConfig};
pub use fetch::{Candidate, FetchConfig, FetchError, ImageFetcher, PolicyRejection};
pub use filter::{
    CandidateClassifier, ClassificationVerdict, FilterConfig, FilterThresholds, SmartFilter,
    VerdictReason,
};
pub use pipeline::{DownloadOptions, DownloadReport, Pipeline, PipelineError};
pub use vision::DecodeError;
