// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decision cascade
//!
//! Rules are evaluated in order and the first match wins:
//! 1. many text boxes keeps the image, regardless of any QR code
//! 2. a flagged QR code with fewer text boxes discards it
//! 3. moderate text keeps it unless the image is card-shaped
//! 4. little text falls back to edge density, then shape

use super::config::FilterThresholds;
use super::verdict::{ClassificationVerdict, Evidence, QrObservation, VerdictReason};

/// Geometry-plus-detector measurements the cascade works from
#[derive(Debug, Clone, Copy)]
pub struct PolicyInput {
    pub text_box_count: usize,
    pub width: u32,
    pub height: u32,
    pub qr: QrObservation,
}

/// Longest side over shortest side; 1.0 for degenerate sizes
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    let (long, short) = if width >= height {
        (width, height)
    } else {
        (height, width)
    };
    if short == 0 {
        return 1.0;
    }
    long as f64 / short as f64
}

/// Run the cascade. `edge_density` is evaluated only on the low-text branch.
pub fn decide<F>(
    input: &PolicyInput,
    thresholds: &FilterThresholds,
    edge_density: F,
) -> ClassificationVerdict
where
    F: FnOnce() -> f64,
{
    let aspect = aspect_ratio(input.width, input.height);
    decide_with_aspect(
        input.text_box_count,
        aspect,
        &input.qr,
        thresholds,
        edge_density,
    )
}

/// Same cascade over an already computed aspect ratio
pub fn decide_with_aspect<F>(
    text_box_count: usize,
    aspect: f64,
    qr: &QrObservation,
    thresholds: &FilterThresholds,
    edge_density: F,
) -> ClassificationVerdict
where
    F: FnOnce() -> f64,
{
    let mut evidence = Evidence {
        text_box_count: Some(text_box_count),
        aspect_ratio: aspect,
        edge_density: None,
        qr_area_ratio: qr.area_ratio,
    };

    if text_box_count >= thresholds.high_text_boxes {
        return ClassificationVerdict::new(VerdictReason::HighTextDensity, evidence);
    }

    if qr.is_flagged() {
        return ClassificationVerdict::new(VerdictReason::QrDominatedLowText, evidence);
    }

    if text_box_count >= thresholds.moderate_text_boxes {
        let reason = if aspect < thresholds.card_aspect_ratio {
            VerdictReason::CardShapedModerateText
        } else {
            VerdictReason::AdequateText
        };
        return ClassificationVerdict::new(reason, evidence);
    }

    let density = edge_density();
    evidence.edge_density = Some(density);

    let reason = if text_box_count > 0 && density > thresholds.sparse_text_edge_density {
        VerdictReason::SparseTextWithLineDetail
    } else if text_box_count == 0 && density > thresholds.no_text_edge_density {
        VerdictReason::LineRichNoText
    } else if aspect > thresholds.strip_aspect_ratio {
        VerdictReason::DegenerateStrip
    } else {
        VerdictReason::TooSparse
    };
    ClassificationVerdict::new(reason, evidence)
}
