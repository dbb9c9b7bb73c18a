// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! EAST text-region sub-detector
//!
//! - `preprocessing`: resize and mean subtraction into a 4-D tensor
//! - `decode`: score/geometry maps to boxes, plus suppression
//! - `detector`: ONNX Runtime session wrapper

pub mod decode;
pub mod detector;
pub mod preprocessing;

pub use decode::{decode_predictions, non_max_suppression, OutputLayout, TextBox};
pub use detector::EastTextDetector;
pub use preprocessing::{preprocess_for_detection, EAST_INPUT_SIZE};
