// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use article_pdf::fetch::{FetchConfig, FetchError, ImageFetcher, PolicyRejection};
use axum::http::StatusCode;
use std::collections::HashMap;

use crate::support::{png_bytes, Asset, AssetServer};

async fn fetch(asset: Asset, config: FetchConfig) -> Result<(), FetchError> {
    let server = AssetServer::start(HashMap::from([("item".to_string(), asset)])).await;
    let fetcher = ImageFetcher::new(config).unwrap();
    fetcher.fetch_one(&server.url("item")).await.map(|_| ())
}

#[tokio::test]
async fn test_markup_content_type_rejected() {
    let result = fetch(
        Asset::image(png_bytes(400, 400, 1), "text/html; charset=utf-8"),
        FetchConfig::default(),
    )
    .await;
    assert!(matches!(
        result,
        Err(FetchError::Rejected(PolicyRejection::DisallowedContentType(ref ct))) if ct.contains("text/html")
    ));
}

#[tokio::test]
async fn test_svg_content_type_rejected() {
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="400"></svg>"#;
    let result = fetch(Asset::image(svg.to_vec(), "image/svg+xml"), FetchConfig::default()).await;
    assert!(matches!(
        result,
        Err(FetchError::Rejected(PolicyRejection::DisallowedContentType(_)))
    ));
}

#[tokio::test]
async fn test_missing_content_type_still_sniffed() {
    let result = fetch(
        Asset::image(png_bytes(400, 400, 1), "application/octet-stream"),
        FetchConfig::default(),
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_bad_status_is_error() {
    let result = fetch(Asset::status(StatusCode::NOT_FOUND), FetchConfig::default()).await;
    assert!(matches!(result, Err(FetchError::HttpStatus(404))));
}

#[tokio::test]
async fn test_corrupt_bytes_fail_decode() {
    let mut bytes = png_bytes(400, 400, 1);
    bytes.truncate(bytes.len() / 3);
    let result = fetch(Asset::image(bytes, "image/png"), FetchConfig::default()).await;
    assert!(matches!(result, Err(FetchError::Decode(_))));
}

#[tokio::test]
async fn test_undersized_image_rejected() {
    let result = fetch(Asset::png(299, 800, 1), FetchConfig::default()).await;
    assert!(matches!(
        result,
        Err(FetchError::Rejected(PolicyRejection::Undersized {
            width: 299,
            height: 800,
            min: 300
        }))
    ));

    let result = fetch(Asset::png(300, 300, 1), FetchConfig::default()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_pixel_ceiling_rejected() {
    let config = FetchConfig {
        max_image_pixels: 500 * 500 - 1,
        ..Default::default()
    };
    let result = fetch(Asset::png(500, 500, 1), config).await;
    assert!(matches!(
        result,
        Err(FetchError::Rejected(PolicyRejection::PixelCeiling {
            width: 500,
            height: 500
        }))
    ));
}

#[tokio::test]
async fn test_jpeg_candidate_is_rgb() {
    let server = AssetServer::start(HashMap::from([(
        "photo.jpg".to_string(),
        Asset::jpeg(640, 360, 200),
    )]))
    .await;
    let fetcher = ImageFetcher::new(FetchConfig::default()).unwrap();
    let candidate = fetcher.fetch_one(&server.url("photo.jpg")).await.unwrap();
    assert_eq!(candidate.dimensions(), (640, 360));
    assert_eq!(candidate.url, server.url("photo.jpg"));
}

#[tokio::test]
async fn test_browser_identity_and_referer_sent() {
    let server = AssetServer::start(HashMap::from([(
        "item".to_string(),
        Asset::png(300, 300, 1),
    )]))
    .await;
    let fetcher = ImageFetcher::new(FetchConfig::default()).unwrap();
    fetcher.fetch_one(&server.url("item")).await.unwrap();

    let referer = server.stats.last_referer.lock().unwrap().clone();
    assert_eq!(referer.as_deref(), Some("https://mp.weixin.qq.com/"));
    let user_agent = server.stats.last_user_agent.lock().unwrap().clone();
    assert!(user_agent.unwrap().starts_with("Mozilla/5.0"));
}
