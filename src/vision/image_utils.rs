// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded image decoding for fetched payloads

use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use thiserror::Error;

/// Errors raised while turning fetched bytes into a raster
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Image data is empty")]
    EmptyData,

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image of {width}x{height} exceeds the pixel ceiling of {max_pixels}")]
    PixelCeiling {
        width: u32,
        height: u32,
        max_pixels: u64,
    },
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode raw image bytes into a 3-channel raster
///
/// The header is read first and the image is rejected if its declared pixel
/// count exceeds `max_pixels`, so a small payload announcing absurd
/// dimensions is never expanded in memory.
///
/// # Returns
/// * `Ok((RgbImage, ImageInfo))` - The decoded image and metadata
/// * `Err(DecodeError)` - If the bytes are empty, unrecognized, corrupt or too large
pub fn decode_image_bytes(
    bytes: &[u8],
    max_pixels: u64,
) -> Result<(RgbImage, ImageInfo), DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;
    check_pixel_ceiling(width, height, max_pixels)?;

    let img = ImageReader::with_format(Cursor::new(bytes), format)
        .decode()
        .map_err(|e| DecodeError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((normalize_to_rgb(img), info))
}

fn check_pixel_ceiling(width: u32, height: u32, max_pixels: u64) -> Result<(), DecodeError> {
    if width as u64 * height as u64 > max_pixels {
        return Err(DecodeError::PixelCeiling {
            width,
            height,
            max_pixels,
        });
    }
    Ok(())
}

/// Drop alpha and expand palette/grayscale data to 8-bit RGB
pub fn normalize_to_rgb(img: DynamicImage) -> RgbImage {
    match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.into_rgb8(),
    }
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    if bytes.len() < 4 {
        return Err(DecodeError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF87a / GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II or MM
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(DecodeError::UnsupportedFormat),
    }
}
