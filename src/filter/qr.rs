// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! QR code sub-detector
//!
//! Tries to decode a QR payload in three passes (raw grayscale, inverted,
//! fixed-threshold binarized). The first pass yielding a non-empty payload
//! decides the area ratio. Without a payload, a located but undecodable grid
//! in the raw pass can still flag the image when it is large enough.

use image::GrayImage;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use super::config::FilterThresholds;
use super::verdict::{QrObservation, QrSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Raw,
    Inverted,
    Binarized(u8),
}

impl Pass {
    fn apply(self, value: u8) -> u8 {
        match self {
            Pass::Raw => value,
            Pass::Inverted => 255 - value,
            Pass::Binarized(threshold) => {
                if value > threshold {
                    255
                } else {
                    0
                }
            }
        }
    }
}

struct LocatedCode {
    area: f64,
    payload: Option<String>,
}

/// Run the QR sub-detector on a grayscale image.
///
/// Never fails: any internal detector fault is reported as "no QR".
pub fn detect_qr(gray: &GrayImage, thresholds: &FilterThresholds) -> QrObservation {
    match panic::catch_unwind(AssertUnwindSafe(|| scan(gray, thresholds))) {
        Ok(observation) => observation,
        Err(_) => {
            warn!("QR detection error, treating image as QR-free");
            QrObservation::none()
        }
    }
}

fn scan(gray: &GrayImage, thresholds: &FilterThresholds) -> QrObservation {
    let (width, height) = gray.dimensions();
    let image_area = width as f64 * height as f64;
    if image_area == 0.0 {
        return QrObservation::none();
    }

    let passes = [
        Pass::Raw,
        Pass::Inverted,
        Pass::Binarized(thresholds.qr_binary_threshold),
    ];

    let mut pattern_area: Option<f64> = None;
    for pass in passes {
        let located = locate_codes(gray, pass);
        if let Some(code) = located.iter().find(|c| c.payload.is_some()) {
            let ratio = code.area / image_area;
            debug!(?pass, ratio, "QR payload decoded");
            return classify_decoded(ratio, thresholds);
        }
        if pass == Pass::Raw {
            pattern_area = located.iter().map(|c| c.area).reduce(f64::max);
        }
    }

    match pattern_area {
        Some(area) => classify_pattern_only(area / image_area, thresholds),
        None => QrObservation::none(),
    }
}

fn locate_codes(gray: &GrayImage, pass: Pass) -> Vec<LocatedCode> {
    let (width, height) = gray.dimensions();
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
            pass.apply(gray.get_pixel(x as u32, y as u32)[0])
        });

    prepared
        .detect_grids()
        .into_iter()
        .map(|grid| {
            let corners: Vec<(f64, f64)> = grid
                .bounds
                .iter()
                .map(|p| (p.x as f64, p.y as f64))
                .collect();
            let payload = grid
                .decode()
                .ok()
                .map(|(_, content)| content)
                .filter(|content| !content.is_empty());
            LocatedCode {
                area: polygon_area(&corners),
                payload,
            }
        })
        .collect()
}

/// Signal for a decoded code covering `ratio` of the image
pub fn classify_decoded(ratio: f64, thresholds: &FilterThresholds) -> QrObservation {
    let signal = if ratio > thresholds.qr_dominant_ratio {
        QrSignal::Dominant
    } else if ratio > thresholds.qr_prominent_ratio {
        QrSignal::Prominent
    } else {
        QrSignal::None
    };
    QrObservation {
        signal,
        area_ratio: Some(ratio),
        decoded: true,
    }
}

/// Signal for a located code whose payload could not be read
pub fn classify_pattern_only(ratio: f64, thresholds: &FilterThresholds) -> QrObservation {
    let signal = if ratio > thresholds.qr_pattern_only_ratio {
        QrSignal::Prominent
    } else {
        QrSignal::None
    };
    QrObservation {
        signal,
        area_ratio: Some(ratio),
        decoded: false,
    }
}

/// Shoelace area of a simple polygon
pub fn polygon_area(points: &[(f64, f64)]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..points.len() {
        let (x1, y1) = points[i];
        let (x2, y2) = points[(i + 1) % points.len()];
        twice_area += x1 * y2 - x2 * y1;
    }
    twice_area.abs() / 2.0
}
