// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the smart filter
//!
//! Every empirical constant of the classification cascade lives here as a
//! named field so deployments can retune without code changes.

use std::env;
use std::path::PathBuf;

/// Default location of the EAST scene-text detector (ONNX export)
pub const DEFAULT_EAST_MODEL_PATH: &str = "./models/frozen_east_text_detection.onnx";

/// Tensor layout expected by the detector's image input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLayout {
    /// `[1, 3, H, W]` (OpenCV blob layout)
    Nchw,
    /// `[1, H, W, 3]` (TensorFlow export layout)
    Nhwc,
}

impl InputLayout {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "nchw" => Some(Self::Nchw),
            "nhwc" => Some(Self::Nhwc),
            _ => None,
        }
    }
}

/// Thresholds used by the QR, text and edge sub-detectors and the decision cascade
#[derive(Debug, Clone, PartialEq)]
pub struct FilterThresholds {
    /// Decoded QR covering more than this share of the image is "dominant"
    pub qr_dominant_ratio: f64,
    /// Decoded QR covering more than this share is "prominent"
    pub qr_prominent_ratio: f64,
    /// Undecodable QR pattern covering more than this share is "prominent"
    pub qr_pattern_only_ratio: f64,
    /// Fixed threshold for the binarized QR pass
    pub qr_binary_threshold: u8,
    /// Discard a dominant QR before running text detection at all
    pub dominant_qr_short_circuit: bool,
    /// Square detector input side (multiple of 32)
    pub east_input_size: u32,
    /// Minimum cell confidence for a text box candidate
    pub text_confidence: f32,
    /// Overlap above which the weaker of two boxes is suppressed
    pub nms_overlap: f32,
    /// Text box count at or above which an image is always kept
    pub high_text_boxes: usize,
    /// Lower bound of the "moderate text" band
    pub moderate_text_boxes: usize,
    /// Moderate-text images squarer than this are treated as cards
    pub card_aspect_ratio: f64,
    /// Low-text images more elongated than this are separators
    pub strip_aspect_ratio: f64,
    /// Edge density needed to keep an image with a few text boxes
    pub sparse_text_edge_density: f64,
    /// Edge density needed to keep an image with no text boxes
    pub no_text_edge_density: f64,
    /// Canny hysteresis thresholds
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            qr_dominant_ratio: 0.40,
            qr_prominent_ratio: 0.05,
            qr_pattern_only_ratio: 0.20,
            qr_binary_threshold: 128,
            dominant_qr_short_circuit: true,
            east_input_size: 320,
            text_confidence: 0.5,
            nms_overlap: 0.4,
            high_text_boxes: 8,
            moderate_text_boxes: 4,
            card_aspect_ratio: 1.3,
            strip_aspect_ratio: 4.0,
            sparse_text_edge_density: 0.01,
            no_text_edge_density: 0.05,
            canny_low: 50.0,
            canny_high: 150.0,
        }
    }
}

impl FilterThresholds {
    /// Validate threshold values
    pub fn validate(&self) -> Result<(), String> {
        if self.east_input_size == 0 || self.east_input_size % 32 != 0 {
            return Err(format!(
                "east_input_size must be a positive multiple of 32, got {}",
                self.east_input_size
            ));
        }
        if self.moderate_text_boxes > self.high_text_boxes {
            return Err("moderate_text_boxes must not exceed high_text_boxes".to_string());
        }
        if !(0.0..=1.0).contains(&self.text_confidence) {
            return Err("text_confidence must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.nms_overlap) {
            return Err("nms_overlap must be within [0, 1]".to_string());
        }
        if self.qr_prominent_ratio > self.qr_dominant_ratio {
            return Err("qr_prominent_ratio must not exceed qr_dominant_ratio".to_string());
        }
        if self.canny_low > self.canny_high {
            return Err("canny_low must not exceed canny_high".to_string());
        }
        Ok(())
    }
}

/// Smart filter configuration: model location plus thresholds
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Path to the detector weights; a missing file degrades to keep-all
    pub model_path: PathBuf,
    /// Tensor layout of the detector input
    pub input_layout: InputLayout,
    /// Cascade thresholds
    pub thresholds: FilterThresholds,
}

impl FilterConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            model_path: env::var("EAST_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_EAST_MODEL_PATH)),
            input_layout: env::var("EAST_INPUT_LAYOUT")
                .ok()
                .and_then(|v| InputLayout::parse(&v))
                .unwrap_or(InputLayout::Nhwc),
            thresholds: FilterThresholds::default(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.thresholds.validate()
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_EAST_MODEL_PATH),
            input_layout: InputLayout::Nhwc,
            thresholds: FilterThresholds::default(),
        }
    }
}
