// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Smart filter: keep/discard classification of fetched images
//!
//! Combines three sub-detectors into the decision cascade in [`policy`]:
//! - QR code detection (`qr`)
//! - EAST text-region detection (`east`)
//! - Canny edge density (`edges`)
//!
//! The detector model is loaded at most once per [`SmartFilter`]. When it is
//! missing, every image is kept with reason "model unavailable".

pub mod config;
pub mod east;
pub mod edges;
pub mod policy;
pub mod qr;
pub mod verdict;

pub use config::{FilterConfig, FilterThresholds, InputLayout};
pub use east::EastTextDetector;
pub use policy::{aspect_ratio, PolicyInput};
pub use verdict::{ClassificationVerdict, Evidence, QrObservation, QrSignal, VerdictReason};

use anyhow::Result;
use image::{imageops, RgbImage};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Classifies one decoded image. Implementations must be pure per call.
#[cfg_attr(test, mockall::automock)]
pub trait CandidateClassifier: Send + Sync {
    fn classify(&self, image: &RgbImage) -> Result<ClassificationVerdict>;
}

/// Counts text regions in an image
#[cfg_attr(test, mockall::automock)]
pub trait TextRegionCounter: Send + Sync {
    fn count_text_boxes(&self, image: &RgbImage, thresholds: &FilterThresholds) -> Result<usize>;
}

impl TextRegionCounter for EastTextDetector {
    fn count_text_boxes(&self, image: &RgbImage, thresholds: &FilterThresholds) -> Result<usize> {
        EastTextDetector::count_text_boxes(self, image, thresholds)
    }
}

/// Classification engine holding the shared detector handle
pub struct SmartFilter {
    config: FilterConfig,
    detector: OnceLock<Option<Box<dyn TextRegionCounter>>>,
}

impl std::fmt::Debug for SmartFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartFilter")
            .field("config", &self.config)
            .field("detector_loaded", &self.detector.get().map(Option::is_some))
            .finish()
    }
}

impl SmartFilter {
    /// Filter that loads the EAST model from `config.model_path` on first use
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            detector: OnceLock::new(),
        }
    }

    /// Filter using an already constructed text detector
    pub fn with_text_detector<D>(config: FilterConfig, detector: D) -> Self
    where
        D: TextRegionCounter + 'static,
    {
        let detector: Box<dyn TextRegionCounter> = Box::new(detector);
        Self {
            config,
            detector: OnceLock::from(Some(detector)),
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Load the detector if not yet attempted. Returns whether it is available.
    ///
    /// Concurrent first calls block until the single load finishes.
    pub fn load_model(&self) -> bool {
        self.detector().is_some()
    }

    fn detector(&self) -> Option<&dyn TextRegionCounter> {
        self.detector
            .get_or_init(|| {
                match EastTextDetector::load(&self.config.model_path, self.config.input_layout) {
                    Ok(detector) => {
                        info!(path = %self.config.model_path.display(), "EAST model ready");
                        Some(Box::new(detector) as Box<dyn TextRegionCounter>)
                    }
                    Err(e) => {
                        warn!(
                            path = %self.config.model_path.display(),
                            error = %e,
                            "EAST model unavailable, smart filter will keep every image"
                        );
                        None
                    }
                }
            })
            .as_deref()
    }

    /// Run the full cascade on one image
    pub fn classify_image(&self, image: &RgbImage) -> Result<ClassificationVerdict> {
        let (width, height) = image.dimensions();
        let aspect = aspect_ratio(width, height);

        let Some(detector) = self.detector() else {
            return Ok(ClassificationVerdict::new(
                VerdictReason::ModelUnavailable,
                Evidence {
                    aspect_ratio: aspect,
                    ..Default::default()
                },
            ));
        };

        let thresholds = &self.config.thresholds;
        let gray = imageops::grayscale(image);

        let qr = qr::detect_qr(&gray, thresholds);
        if qr.signal == QrSignal::Dominant && thresholds.dominant_qr_short_circuit {
            return Ok(ClassificationVerdict::new(
                VerdictReason::DominantQr,
                Evidence {
                    text_box_count: None,
                    aspect_ratio: aspect,
                    edge_density: None,
                    qr_area_ratio: qr.area_ratio,
                },
            ));
        }

        let text_box_count = detector.count_text_boxes(image, thresholds)?;

        let input = PolicyInput {
            text_box_count,
            width,
            height,
            qr,
        };
        Ok(policy::decide(&input, thresholds, || {
            edges::edge_density(&gray, thresholds.canny_low, thresholds.canny_high)
        }))
    }
}

impl CandidateClassifier for SmartFilter {
    fn classify(&self, image: &RgbImage) -> Result<ClassificationVerdict> {
        self.classify_image(image)
    }
}
