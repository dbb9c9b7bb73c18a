// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the EAST text detector

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

use crate::filter::config::InputLayout;

/// Default square input side for the detector (must be a multiple of 32)
pub const EAST_INPUT_SIZE: u32 = 320;

/// Per-channel means (R, G, B) the detector was trained with
pub const MEAN: [f32; 3] = [123.68, 116.78, 103.94];

/// The detector emits one score/geometry cell per this many input pixels
pub const OUTPUT_STRIDE: usize = 4;

/// Preprocess an image for EAST text detection
///
/// Steps:
/// 1. Stretch-resize to `size` x `size` (bilinear)
/// 2. Keep RGB channel order, subtract the per-channel mean, no scaling
/// 3. Lay out as `[1, 3, H, W]` or `[1, H, W, 3]`
pub fn preprocess_for_detection(image: &RgbImage, size: u32, layout: InputLayout) -> Array4<f32> {
    let resized = imageops::resize(image, size, size, FilterType::Triangle);
    let side = size as usize;

    let mut tensor = match layout {
        InputLayout::Nchw => Array4::zeros((1, 3, side, side)),
        InputLayout::Nhwc => Array4::zeros((1, side, side, 3)),
    };

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let value = pixel[c] as f32 - MEAN[c];
            match layout {
                InputLayout::Nchw => tensor[[0, c, y, x]] = value,
                InputLayout::Nhwc => tensor[[0, y, x, c]] = value,
            }
        }
    }

    tensor
}
