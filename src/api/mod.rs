// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod convert;
pub mod errors;
pub mod http_server;

pub use convert::{convert_handler, ConvertRequest};
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{router, serve, start_server, AppState};
