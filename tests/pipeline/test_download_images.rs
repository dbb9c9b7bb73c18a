// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use article_pdf::filter::{
    CandidateClassifier, ClassificationVerdict, Evidence, FilterConfig, SmartFilter, VerdictReason,
};
use article_pdf::pipeline::{DownloadOptions, Pipeline};
use article_pdf::PipelineConfig;
use axum::http::StatusCode;
use image::RgbImage;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::support::{Asset, AssetServer};

/// Keeps images whose tag is in the allow list
struct TagClassifier {
    keep: HashSet<u8>,
    calls: AtomicUsize,
}

impl TagClassifier {
    fn new(keep: &[u8]) -> Self {
        Self {
            keep: keep.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl CandidateClassifier for TagClassifier {
    fn classify(&self, image: &RgbImage) -> Result<ClassificationVerdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reason = if self.keep.contains(&image.get_pixel(0, 0)[0]) {
            VerdictReason::AdequateText
        } else {
            VerdictReason::TooSparse
        };
        Ok(ClassificationVerdict::new(reason, Evidence::default()))
    }
}

fn tags(images: &[RgbImage]) -> Vec<u8> {
    images.iter().map(|image| image.get_pixel(0, 0)[0]).collect()
}

/// Ten URLs: tags 1..=10, where 4 returns 404 and 8 is undersized
async fn ten_image_server() -> (AssetServer, Vec<String>) {
    let mut assets = HashMap::new();
    for tag in 1..=10u8 {
        let asset = match tag {
            4 => Asset::status(StatusCode::NOT_FOUND),
            8 => Asset::png(120, 640, tag),
            _ => Asset::png(300 + tag as u32 * 10, 400, tag),
        };
        assets.insert(format!("{}.png", tag), asset);
    }
    let server = AssetServer::start(assets).await;
    let urls = (1..=10u8)
        .map(|tag| server.url(&format!("{}.png", tag)))
        .collect();
    (server, urls)
}

fn pipeline(classifier: Arc<dyn CandidateClassifier>, discard_dir: PathBuf) -> Pipeline {
    let config = PipelineConfig {
        discard_dir,
        ..Default::default()
    };
    Pipeline::new(&config, classifier).unwrap()
}

#[tokio::test]
async fn test_end_to_end_keeps_classified_images_in_order() {
    let (_server, urls) = ten_image_server().await;
    let classifier = Arc::new(TagClassifier::new(&[1, 3, 6, 9, 10]));
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(classifier.clone(), dir.path().join("discarded"));

    let outcome = pipeline
        .download(&urls, DownloadOptions::default(), &CancellationToken::new())
        .await;

    assert_eq!(tags(&outcome.kept), vec![1, 3, 6, 9, 10]);
    assert_eq!(outcome.report.requested, 10);
    assert_eq!(outcome.report.fetched, 8);
    assert_eq!(outcome.report.kept, 5);
    assert_eq!(outcome.report.discarded, 3);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 8);
    assert!(!dir.path().join("discarded").exists());
}

#[tokio::test]
async fn test_download_images_returns_only_kept() {
    let (_server, urls) = ten_image_server().await;
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(
        Arc::new(TagClassifier::new(&[2, 5, 7])),
        dir.path().join("discarded"),
    );

    let images = pipeline
        .download_images(&urls, DownloadOptions::default(), &CancellationToken::new())
        .await;
    assert_eq!(tags(&images), vec![2, 5, 7]);
}

#[tokio::test]
async fn test_no_filter_keeps_every_fetched_image() {
    let (_server, urls) = ten_image_server().await;
    let classifier = Arc::new(TagClassifier::new(&[]));
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(classifier.clone(), dir.path().join("discarded"));

    let options = DownloadOptions {
        no_filter: true,
        save_discarded: true,
    };
    let outcome = pipeline
        .download(&urls, options, &CancellationToken::new())
        .await;

    // Undersized and missing images are still gone
    assert_eq!(tags(&outcome.kept), vec![1, 2, 3, 5, 6, 7, 9, 10]);
    assert_eq!(outcome.report.discarded, 0);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("discarded").exists());
}

#[tokio::test]
async fn test_discarded_images_saved_when_enabled() {
    let (_server, urls) = ten_image_server().await;
    let dir = TempDir::new().unwrap();
    let discard_dir = dir.path().join("discarded");
    let pipeline = pipeline(Arc::new(TagClassifier::new(&[1, 2, 3, 5, 6])), discard_dir.clone());

    let options = DownloadOptions {
        no_filter: false,
        save_discarded: true,
    };
    let outcome = pipeline
        .download(&urls, options, &CancellationToken::new())
        .await;

    assert_eq!(outcome.report.discarded, 3);
    for i in 0..3 {
        assert!(discard_dir.join(format!("discarded_{}.jpg", i)).exists());
    }
    assert!(!discard_dir.join("discarded_3.jpg").exists());
}

#[tokio::test]
async fn test_missing_model_keeps_everything() {
    let (_server, urls) = ten_image_server().await;
    let filter = Arc::new(SmartFilter::new(FilterConfig {
        model_path: PathBuf::from("/nonexistent/frozen_east_text_detection.onnx"),
        ..Default::default()
    }));
    assert!(!filter.load_model());

    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(filter, dir.path().join("discarded"));
    let outcome = pipeline
        .download(&urls, DownloadOptions::default(), &CancellationToken::new())
        .await;

    assert_eq!(tags(&outcome.kept), vec![1, 2, 3, 5, 6, 7, 9, 10]);
    assert_eq!(outcome.report.discarded, 0);
}

#[tokio::test]
async fn test_concurrent_downloads_do_not_share_slots() {
    let ceiling = 2;
    let mut assets = HashMap::new();
    for tag in 1..=8u8 {
        assets.insert(
            format!("{}.png", tag),
            Asset::png(320, 320, tag).delayed(std::time::Duration::from_millis(300)),
        );
    }
    let server = AssetServer::start(assets).await;
    let first: Vec<String> = (1..=4u8).map(|t| server.url(&format!("{}.png", t))).collect();
    let second: Vec<String> = (5..=8u8).map(|t| server.url(&format!("{}.png", t))).collect();

    let mut config = PipelineConfig::default();
    config.fetch.max_concurrent_downloads = ceiling;
    let pipeline = Arc::new(Pipeline::new(&config, Arc::new(TagClassifier::new(&[]))).unwrap());

    let options = DownloadOptions {
        no_filter: true,
        ..Default::default()
    };
    let cancel = CancellationToken::new();
    let (a, b) = tokio::join!(
        pipeline.download(&first, options, &cancel),
        pipeline.download(&second, options, &cancel)
    );

    assert_eq!(tags(&a.kept), vec![1, 2, 3, 4]);
    assert_eq!(tags(&b.kept), vec![5, 6, 7, 8]);
    assert!(server.stats.max_in_flight() > ceiling);
    assert!(server.stats.max_in_flight() <= 2 * ceiling);
}
