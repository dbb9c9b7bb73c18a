// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Convert endpoint handler

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::request::ConvertRequest;
use crate::api::errors::ApiError;
use crate::api::http_server::{ApiErrorResponse, AppState};
use crate::pipeline::DownloadOptions;

pub const PDF_FILENAME: &str = "article.pdf";

/// POST /api/convert - Turn an article into a PDF of its images
///
/// # Request
/// - `url`: Article URL (required)
/// - `no_filter` (alias `disableFilter`): keep every fetched image
///
/// # Response
/// `application/pdf` attachment named `article.pdf`
///
/// # Errors
/// - 400 Bad Request: article unreachable, no image links, nothing
///   downloadable, or everything filtered out
/// - 500 Internal Server Error: anything else
///
/// Dropping the request (client disconnect) cancels in-flight image fetches.
/// Discarded images are never written to disk from this endpoint.
pub async fn convert_handler(
    State(state): State<AppState>,
    Json(request): Json<ConvertRequest>,
) -> Result<Response, ApiErrorResponse> {
    info!(url = %request.url, no_filter = request.no_filter, "Conversion request received");

    request.validate().map_err(ApiErrorResponse)?;

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let options = DownloadOptions {
        no_filter: request.no_filter,
        save_discarded: false,
    };

    let pdf = state
        .pipeline
        .convert(request.url.trim(), options, &cancel)
        .await
        .map_err(|e| {
            warn!(url = %request.url, error = %e, "Conversion failed");
            ApiErrorResponse(ApiError::from(e))
        })?;

    info!(bytes = pdf.len(), "PDF generated, returning attachment");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", PDF_FILENAME),
            ),
        ],
        pdf,
    )
        .into_response())
}
