// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Convert API endpoint module
//!
//! Provides POST /api/convert for turning an article into a PDF.

pub mod handler;
pub mod request;

pub use handler::convert_handler;
pub use request::ConvertRequest;
