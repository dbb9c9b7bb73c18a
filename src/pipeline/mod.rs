// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Article-to-PDF orchestration
//!
//! article markup -> image URLs -> gated fetch -> classification -> PDF.
//! Classification runs on the blocking pool, one task per candidate, and the
//! kept images are reassembled in their original order.

use anyhow::Result;
use futures::future::join_all;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::article::{extract_image_urls, ArticleError, ArticleFetcher};
use crate::compose::{compose_pdf, ComposeError};
use crate::config::PipelineConfig;
use crate::fetch::{Candidate, ImageFetcher};
use crate::filter::CandidateClassifier;

/// Whole-batch failures surfaced to callers
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to fetch article: {0}")]
    ArticleFetch(#[from] ArticleError),

    #[error("No image URLs found in the article")]
    NoImageUrls,

    #[error("None of the {0} images could be downloaded")]
    NoImagesFetched(usize),

    #[error("All {0} downloaded images were filtered out")]
    AllFiltered(usize),

    #[error("Failed to compose PDF: {0}")]
    Compose(#[from] ComposeError),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadOptions {
    /// Keep every fetched image without classification
    pub no_filter: bool,
    /// Write discarded images to the discard directory
    pub save_discarded: bool,
}

/// Counts for one download batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub requested: usize,
    pub fetched: usize,
    pub kept: usize,
    pub discarded: usize,
}

#[derive(Debug)]
pub struct DownloadOutcome {
    pub kept: Vec<RgbImage>,
    pub report: DownloadReport,
}

/// Candidates split by verdict, each side in input order
#[derive(Debug, Default)]
pub struct Partition {
    pub kept: Vec<Candidate>,
    pub discarded: Vec<Candidate>,
}

/// Classify every candidate on the blocking pool.
///
/// A classification error drops that candidate from both sides.
pub async fn partition_candidates(
    classifier: Arc<dyn CandidateClassifier>,
    candidates: Vec<Candidate>,
) -> Partition {
    let tasks = candidates.into_iter().map(|candidate| {
        let classifier = classifier.clone();
        tokio::task::spawn_blocking(move || {
            let verdict = classifier.classify(&candidate.image);
            (candidate, verdict)
        })
    });

    let mut partition = Partition::default();
    for joined in join_all(tasks).await {
        let (candidate, verdict) = match joined {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Classification task failed");
                continue;
            }
        };

        let size_kib = candidate.size_bytes / 1024;
        match verdict {
            Ok(verdict) if verdict.keep => {
                info!(url = %candidate.url, size_kib, "[Kept] {}", verdict);
                partition.kept.push(candidate);
            }
            Ok(verdict) => {
                info!(url = %candidate.url, size_kib, "[Discarded] {}", verdict);
                partition.discarded.push(candidate);
            }
            Err(e) => {
                warn!(url = %candidate.url, error = %e, "Classification error, dropping image");
            }
        }
    }
    partition
}

/// Write images as `discarded_<i>.jpg` into `dir`
pub fn save_discarded_images(images: &[RgbImage], dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)?;
    for (i, image) in images.iter().enumerate() {
        image.save(dir.join(format!("discarded_{}.jpg", i)))?;
    }
    Ok(images.len())
}

/// End-to-end pipeline with its long-lived clients and classifier
pub struct Pipeline {
    articles: ArticleFetcher,
    fetcher: ImageFetcher,
    classifier: Arc<dyn CandidateClassifier>,
    discard_dir: PathBuf,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig, classifier: Arc<dyn CandidateClassifier>) -> Result<Self> {
        Ok(Self {
            articles: ArticleFetcher::new(config.fetch.request_timeout_secs)?,
            fetcher: ImageFetcher::new(config.fetch.clone())?,
            classifier,
            discard_dir: config.discard_dir.clone(),
        })
    }

    pub fn fetcher(&self) -> &ImageFetcher {
        &self.fetcher
    }

    /// Fetch and classify `urls`, returning kept images and batch counts
    pub async fn download(
        &self,
        urls: &[String],
        options: DownloadOptions,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        let candidates = self.fetcher.fetch_candidates(urls, cancel).await;
        let fetched = candidates.len();
        info!(requested = urls.len(), fetched, "Image download complete");

        if options.no_filter {
            let kept: Vec<RgbImage> = candidates.into_iter().map(|c| c.image).collect();
            return DownloadOutcome {
                report: DownloadReport {
                    requested: urls.len(),
                    fetched,
                    kept: kept.len(),
                    discarded: 0,
                },
                kept,
            };
        }

        let partition = partition_candidates(self.classifier.clone(), candidates).await;
        let report = DownloadReport {
            requested: urls.len(),
            fetched,
            kept: partition.kept.len(),
            discarded: partition.discarded.len(),
        };
        info!(
            kept = report.kept,
            discarded = report.discarded,
            "Smart filter complete"
        );

        if options.save_discarded && !partition.discarded.is_empty() {
            let discarded: Vec<RgbImage> =
                partition.discarded.into_iter().map(|c| c.image).collect();
            let dir = self.discard_dir.clone();
            match tokio::task::spawn_blocking(move || save_discarded_images(&discarded, &dir)).await
            {
                Ok(Ok(count)) => {
                    info!(count, dir = %self.discard_dir.display(), "Saved discarded images")
                }
                Ok(Err(e)) => warn!(error = %e, "Failed to save discarded images"),
                Err(e) => warn!(error = %e, "Discarded image task failed"),
            }
        }

        DownloadOutcome {
            kept: partition.kept.into_iter().map(|c| c.image).collect(),
            report,
        }
    }

    /// Kept images for `urls`, in their original relative order
    pub async fn download_images(
        &self,
        urls: &[String],
        options: DownloadOptions,
        cancel: &CancellationToken,
    ) -> Vec<RgbImage> {
        self.download(urls, options, cancel).await.kept
    }

    /// Fetch an article and return the images that survive filtering
    pub async fn collect_images(
        &self,
        article_url: &str,
        options: DownloadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<RgbImage>, PipelineError> {
        let html = tokio::select! {
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            html = self.articles.fetch_html(article_url) => html?,
        };

        let urls = extract_image_urls(&html);
        if urls.is_empty() {
            return Err(PipelineError::NoImageUrls);
        }
        info!(count = urls.len(), "Extracted image URLs");

        let outcome = self.download(&urls, options, cancel).await;
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        if outcome.report.fetched == 0 {
            return Err(PipelineError::NoImagesFetched(urls.len()));
        }
        if outcome.kept.is_empty() {
            return Err(PipelineError::AllFiltered(outcome.report.fetched));
        }
        Ok(outcome.kept)
    }

    /// Fetch an article and assemble its kept images into PDF bytes
    pub async fn convert(
        &self,
        article_url: &str,
        options: DownloadOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, PipelineError> {
        let images = self.collect_images(article_url, options, cancel).await?;
        let pages = images.len();
        let pdf = tokio::task::spawn_blocking(move || compose_pdf(&images))
            .await
            .map_err(|e| PipelineError::Internal(format!("PDF task failed: {}", e)))??;
        info!(pages, bytes = pdf.len(), "PDF assembled");
        Ok(pdf)
    }
}
