// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Edge-density sub-detector, used as the low-text fallback signal

use image::GrayImage;
use imageproc::edges::canny;

/// Share of pixels marked as edges by a Canny detector with the given
/// hysteresis thresholds. Returns 0.0 for empty images.
pub fn edge_density(gray: &GrayImage, low: f32, high: f32) -> f64 {
    let total = gray.width() as u64 * gray.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let edges = canny(gray, low, high);
    let edge_pixels = edges.pixels().filter(|p| p[0] > 0).count() as u64;
    edge_pixels as f64 / total as f64
}
