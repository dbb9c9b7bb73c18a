// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! EAST output decoding and non-maximum suppression
//!
//! The detector emits, at a quarter of the input resolution, a 1-channel score
//! map and a 5-channel geometry map (distances to the top, right, bottom and
//! left edges of a rotated box, plus its angle).

use anyhow::{bail, Context, Result};
use ndarray::{ArrayView4, ArrayViewD, Ix4};
use std::cmp::Ordering;

use super::preprocessing::OUTPUT_STRIDE;

/// An axis-aligned text box in detector input coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Cell confidence (0.0-1.0)
    pub confidence: f32,
}

impl TextBox {
    /// Check if this text box is valid (reasonable dimensions)
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.confidence > 0.0
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &TextBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// Memory layout of the detector outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// `[1, C, H, W]`
    Nchw,
    /// `[1, H, W, C]`
    Nhwc,
}

impl OutputLayout {
    /// Infer the layout from the score (1 channel) and geometry (5 channel) shapes
    pub fn infer(scores: &[usize], geometry: &[usize]) -> Result<Self> {
        if scores.len() != 4 || geometry.len() != 4 {
            bail!(
                "Expected 4-D detector outputs, got scores {:?} and geometry {:?}",
                scores,
                geometry
            );
        }
        if scores[1] == 1 && geometry[1] == 5 && scores[2..] == geometry[2..] {
            return Ok(Self::Nchw);
        }
        if scores[3] == 1 && geometry[3] == 5 && scores[1..3] == geometry[1..3] {
            return Ok(Self::Nhwc);
        }
        bail!(
            "Unrecognized detector output shapes: scores {:?}, geometry {:?}",
            scores,
            geometry
        )
    }

    fn grid(self, shape: &[usize]) -> (usize, usize) {
        match self {
            Self::Nchw => (shape[2], shape[3]),
            Self::Nhwc => (shape[1], shape[2]),
        }
    }

    fn at(self, map: &ArrayView4<f32>, channel: usize, y: usize, x: usize) -> f32 {
        match self {
            Self::Nchw => map[[0, channel, y, x]],
            Self::Nhwc => map[[0, y, x, channel]],
        }
    }
}

/// Whether an output shape looks like the 5-channel geometry map
pub fn is_geometry_shape(shape: &[usize]) -> bool {
    shape.len() == 4 && (shape[1] == 5 || shape[3] == 5)
}

/// Reconstruct axis-aligned boxes for every cell scoring at least `min_confidence`
pub fn decode_predictions(
    scores: ArrayViewD<f32>,
    geometry: ArrayViewD<f32>,
    min_confidence: f32,
) -> Result<Vec<TextBox>> {
    let layout = OutputLayout::infer(scores.shape(), geometry.shape())?;
    let scores = scores
        .into_dimensionality::<Ix4>()
        .context("Score map is not 4-D")?;
    let geometry = geometry
        .into_dimensionality::<Ix4>()
        .context("Geometry map is not 4-D")?;

    let (rows, cols) = layout.grid(scores.shape());
    let mut boxes = Vec::new();

    for y in 0..rows {
        for x in 0..cols {
            let score = layout.at(&scores, 0, y, x);
            if score < min_confidence {
                continue;
            }

            let top = layout.at(&geometry, 0, y, x);
            let right = layout.at(&geometry, 1, y, x);
            let bottom = layout.at(&geometry, 2, y, x);
            let left = layout.at(&geometry, 3, y, x);
            let angle = layout.at(&geometry, 4, y, x);

            boxes.push(rbox_to_text_box(
                (x * OUTPUT_STRIDE) as f32,
                (y * OUTPUT_STRIDE) as f32,
                [top, right, bottom, left],
                angle,
                score,
            ));
        }
    }

    Ok(boxes)
}

/// Convert one cell's rotated-box geometry into an axis-aligned box.
///
/// The right/bottom distances, rotated by `angle`, give the anchor; two
/// opposite corners of the rotated rectangle then give its center.
pub fn rbox_to_text_box(
    origin_x: f32,
    origin_y: f32,
    distances: [f32; 4],
    angle: f32,
    confidence: f32,
) -> TextBox {
    let [top, right, bottom, left] = distances;
    let (sin_a, cos_a) = angle.sin_cos();

    let height = top + bottom;
    let width = right + left;

    let anchor_x = origin_x + cos_a * right + sin_a * bottom;
    let anchor_y = origin_y - sin_a * right + cos_a * bottom;

    let p1 = (-sin_a * height + anchor_x, -cos_a * height + anchor_y);
    let p3 = (-cos_a * width + anchor_x, sin_a * width + anchor_y);

    let center_x = 0.5 * (p1.0 + p3.0);
    let center_y = 0.5 * (p1.1 + p3.1);

    TextBox {
        x: center_x - width / 2.0,
        y: center_y - height / 2.0,
        width,
        height,
        confidence,
    }
}

/// Greedy non-maximum suppression.
///
/// Boxes are visited by descending confidence; a box is kept unless it
/// overlaps an already kept box by more than `max_overlap`.
pub fn non_max_suppression(mut boxes: Vec<TextBox>, max_overlap: f32) -> Vec<TextBox> {
    boxes.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<TextBox> = Vec::new();
    for candidate in boxes {
        if kept.iter().all(|k| k.iou(&candidate) <= max_overlap) {
            kept.push(candidate);
        }
    }
    kept
}
