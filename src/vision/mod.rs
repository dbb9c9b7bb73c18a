// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision helpers shared by the fetcher and the smart filter

pub mod image_utils;

pub use image_utils::{decode_image_bytes, detect_format, normalize_to_rgb, DecodeError, ImageInfo};
