// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use article_pdf::api::{serve, AppState};
use article_pdf::filter::{FilterConfig, SmartFilter};
use article_pdf::pipeline::Pipeline;
use article_pdf::PipelineConfig;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::support::client;

pub async fn start_api(pipeline: Pipeline) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState {
        pipeline: Arc::new(pipeline),
    };
    tokio::spawn(async move {
        serve(listener, state).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health_endpoint() {
    let filter = Arc::new(SmartFilter::new(FilterConfig::default()));
    let pipeline = Pipeline::new(&PipelineConfig::default(), filter).unwrap();
    let base = start_api(pipeline).await;

    let response = client()
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let filter = Arc::new(SmartFilter::new(FilterConfig::default()));
    let pipeline = Pipeline::new(&PipelineConfig::default(), filter).unwrap();
    let base = start_api(pipeline).await;

    let response = client()
        .get(format!("{}/api/health", base))
        .header("Origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
