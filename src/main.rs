// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use article_pdf::{
    api::start_server,
    config::{clear_proxy_env, load_env, PipelineConfig},
    filter::SmartFilter,
    pipeline::Pipeline,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so it can set RUST_LOG
    load_env(None);
    tracing_subscriber::fmt::init();

    clear_proxy_env();

    let config = PipelineConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    // Load the text detector once, before accepting requests
    let filter = Arc::new(SmartFilter::new(config.filter.clone()));
    let loader = filter.clone();
    if tokio::task::spawn_blocking(move || loader.load_model()).await? {
        info!(path = %config.filter.model_path.display(), "Smart filter ready");
    } else {
        warn!("Text detector unavailable, smart filter will keep every image");
    }

    let pipeline = Arc::new(Pipeline::new(&config, filter)?);

    let bind_address = config.bind_address();
    info!("Starting article-pdf API on {}", bind_address);
    start_server(pipeline, &bind_address)
        .await
        .map_err(|e| anyhow!("API server failed: {}", e))?;

    Ok(())
}
