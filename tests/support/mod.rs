// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local HTTP server serving synthetic images and article pages
#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// How a body is sent
#[derive(Clone)]
pub enum Payload {
    /// Single body with a Content-Length header
    Full(Vec<u8>),
    /// Chunked transfer, no Content-Length
    Chunked(Vec<Vec<u8>>),
}

#[derive(Clone)]
pub struct Asset {
    pub status: StatusCode,
    pub content_type: String,
    pub payload: Payload,
    pub delay: Duration,
}

impl Asset {
    pub fn image(bytes: Vec<u8>, content_type: &str) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: content_type.to_string(),
            payload: Payload::Full(bytes),
            delay: Duration::ZERO,
        }
    }

    pub fn png(width: u32, height: u32, tag: u8) -> Self {
        Self::image(png_bytes(width, height, tag), "image/png")
    }

    pub fn jpeg(width: u32, height: u32, tag: u8) -> Self {
        Self::image(jpeg_bytes(width, height, tag), "image/jpeg")
    }

    pub fn html(markup: String) -> Self {
        Self::image(markup.into_bytes(), "text/html; charset=utf-8")
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            content_type: "text/plain".to_string(),
            payload: Payload::Full(b"error".to_vec()),
            delay: Duration::ZERO,
        }
    }

    pub fn chunked(mut self, chunk_size: usize) -> Self {
        if let Payload::Full(bytes) = &self.payload {
            let chunks = bytes.chunks(chunk_size).map(|c| c.to_vec()).collect();
            self.payload = Payload::Chunked(chunks);
        }
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Request counters observed by the server
#[derive(Default)]
pub struct ServerStats {
    pub requests: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub last_referer: Mutex<Option<String>>,
    pub last_user_agent: Mutex<Option<String>>,
}

impl ServerStats {
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

struct InFlight(Arc<ServerStats>);

impl InFlight {
    fn enter(stats: Arc<ServerStats>) -> Self {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(stats)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
struct ServerState {
    assets: Arc<RwLock<HashMap<String, Asset>>>,
    stats: Arc<ServerStats>,
}

pub struct AssetServer {
    pub base_url: String,
    pub stats: Arc<ServerStats>,
    assets: Arc<RwLock<HashMap<String, Asset>>>,
    handle: JoinHandle<()>,
}

impl AssetServer {
    /// Serve `assets` under `/assets/<name>` on an ephemeral port
    pub async fn start(assets: HashMap<String, Asset>) -> Self {
        let stats = Arc::new(ServerStats::default());
        let assets = Arc::new(RwLock::new(assets));
        let state = ServerState {
            assets: assets.clone(),
            stats: stats.clone(),
        };
        let app = Router::new()
            .route("/assets/:name", get(serve_asset))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            stats,
            assets,
            handle,
        }
    }

    pub fn url(&self, name: &str) -> String {
        format!("{}/assets/{}", self.base_url, name)
    }

    /// Add or replace an asset after startup
    pub fn insert(&self, name: &str, asset: Asset) {
        self.assets.write().unwrap().insert(name.to_string(), asset);
    }

    /// Publish an article page linking the named assets, returning its URL
    pub fn publish_article(&self, name: &str, linked: &[&str]) -> String {
        let urls: Vec<String> = linked.iter().map(|asset| self.url(asset)).collect();
        self.insert(name, Asset::html(article_html(&urls)));
        self.url(name)
    }
}

impl Drop for AssetServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_asset(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.stats.requests.fetch_add(1, Ordering::SeqCst);
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    *state.stats.last_referer.lock().unwrap() = header_value(header::REFERER);
    *state.stats.last_user_agent.lock().unwrap() = header_value(header::USER_AGENT);

    let _in_flight = InFlight::enter(state.stats.clone());

    let asset = state.assets.read().unwrap().get(&name).cloned();
    let Some(asset) = asset else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if !asset.delay.is_zero() {
        tokio::time::sleep(asset.delay).await;
    }

    let body = match asset.payload {
        Payload::Full(bytes) => Body::from(bytes),
        Payload::Chunked(chunks) => Body::from_stream(futures::stream::iter(
            chunks.into_iter().map(Ok::<_, std::io::Error>),
        )),
    };

    (
        asset.status,
        [(header::CONTENT_TYPE, asset.content_type)],
        body,
    )
        .into_response()
}

/// Solid image whose red channel carries `tag`, for identifying it later
pub fn tagged_image(width: u32, height: u32, tag: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([tag, 128, 64]))
}

pub fn png_bytes(width: u32, height: u32, tag: u8) -> Vec<u8> {
    encode(tagged_image(width, height, tag), ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32, tag: u8) -> Vec<u8> {
    encode(tagged_image(width, height, tag), ImageFormat::Jpeg)
}

fn encode(image: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

/// Article markup with the given image URLs inside the content body
pub fn article_html(image_urls: &[String]) -> String {
    let images: String = image_urls
        .iter()
        .map(|url| format!(r#"<p><img data-src="{}" src="data:placeholder"></p>"#, url))
        .collect();
    format!(
        r#"<html><head><title>Test</title></head><body><div id="js_content">{}</div></body></html>"#,
        images
    )
}

/// Test HTTP client that ignores proxy settings
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
