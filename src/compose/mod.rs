// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PDF assembly: one page per image, sized to the image at 100 DPI

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};
use std::fs;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Page resolution used to size each page from its image
pub const PAGE_DPI: f32 = 100.0;

const JPEG_QUALITY: u8 = 90;
const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("No images to compose")]
    EmptyInput,

    #[error("Failed to encode page image: {0}")]
    Encode(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Failed to write PDF: {0}")]
    Io(#[from] std::io::Error),
}

fn px_to_mm(px: u32) -> Mm {
    Mm(px as f32 * MM_PER_INCH / PAGE_DPI)
}

fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, ComposeError> {
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY)
        .encode_image(image)
        .map_err(|e| ComposeError::Encode(e.to_string()))?;
    Ok(data)
}

/// Assemble the images, in order, into PDF bytes
pub fn compose_pdf(images: &[RgbImage]) -> Result<Vec<u8>, ComposeError> {
    let Some(first) = images.first() else {
        return Err(ComposeError::EmptyInput);
    };

    let (doc, first_page, first_layer) = PdfDocument::new(
        "article",
        px_to_mm(first.width()),
        px_to_mm(first.height()),
        "Page 1",
    );

    for (index, image) in images.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(
                px_to_mm(image.width()),
                px_to_mm(image.height()),
                format!("Page {}", index + 1),
            );
            doc.get_page(page).get_layer(layer)
        };

        let xobject = ImageXObject {
            width: Px(image.width() as usize),
            height: Px(image.height() as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: encode_jpeg(image)?,
            image_filter: Some(ImageFilter::DCT),
            smask: None,
            clipping_bbox: None,
        };

        Image::from(xobject).add_to_layer(
            layer,
            ImageTransform {
                dpi: Some(PAGE_DPI),
                ..Default::default()
            },
        );
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ComposeError::Pdf(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ComposeError::Pdf(format!("PDF buffer error: {e}")))
}

/// Assemble the images into a PDF file, creating parent directories
pub fn save_pdf(images: &[RgbImage], output_path: &Path) -> Result<(), ComposeError> {
    let bytes = compose_pdf(images)?;
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output_path, &bytes)?;
    info!(
        path = %output_path.display(),
        pages = images.len(),
        bytes = bytes.len(),
        "PDF written"
    );
    Ok(())
}
