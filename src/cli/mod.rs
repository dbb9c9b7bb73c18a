// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::compose::save_pdf;
use crate::config::{clear_proxy_env, PipelineConfig};
use crate::filter::SmartFilter;
use crate::pipeline::{DownloadOptions, Pipeline, PipelineError};

/// Convert an article's images into a single PDF
#[derive(Parser, Debug)]
#[command(name = "article-pdf-cli")]
#[command(version)]
#[command(about = "Convert an article's images into a PDF, filtering out QR codes and decorations", long_about = None)]
pub struct Cli {
    /// Article URL
    pub url: String,

    /// Output PDF path
    #[arg(short, long, default_value = "output/output.pdf")]
    pub output: PathBuf,

    /// Disable smart filtering
    #[arg(long)]
    pub no_filter: bool,

    /// Save discarded images for debugging
    #[arg(long)]
    pub save_discarded: bool,

    /// EAST text detector model (ONNX)
    #[arg(long, env = "EAST_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Directory for discarded images
    #[arg(long, env = "DISCARD_DIR")]
    pub discard_dir: Option<PathBuf>,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::from_env();
        if let Some(path) = &self.model_path {
            config.filter.model_path = path.clone();
        }
        if let Some(dir) = &self.discard_dir {
            config.discard_dir = dir.clone();
        }
        config
    }
}

/// Execute CLI command
///
/// Expects `.env` to be loaded already, before arguments are parsed.
pub async fn execute(cli: Cli) -> Result<()> {
    clear_proxy_env();

    let config = cli.pipeline_config();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let filter = Arc::new(SmartFilter::new(config.filter.clone()));
    if !cli.no_filter {
        let loader = filter.clone();
        let available = tokio::task::spawn_blocking(move || loader.load_model())
            .await
            .context("Model loading task failed")?;
        if !available {
            warn!("Text detector unavailable, every image will be kept");
        }
    }

    let pipeline = Pipeline::new(&config, filter)?;
    let options = DownloadOptions {
        no_filter: cli.no_filter,
        save_discarded: cli.save_discarded,
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling downloads");
            interrupt.cancel();
        }
    });

    let images = match pipeline.collect_images(&cli.url, options, &cancel).await {
        Ok(images) => images,
        Err(PipelineError::NoImageUrls) => {
            error!("No image URLs found in the article.");
            anyhow::bail!("no image URLs found");
        }
        Err(PipelineError::NoImagesFetched(_)) | Err(PipelineError::AllFiltered(_)) => {
            error!("No valid images remained after filtering.");
            anyhow::bail!("no valid images remained");
        }
        Err(e) => return Err(e).context("Processing failed"),
    };

    let output = cli.output.clone();
    tokio::task::spawn_blocking(move || save_pdf(&images, &output))
        .await
        .context("PDF task failed")??;

    let shown = std::fs::canonicalize(&cli.output).unwrap_or_else(|_| cli.output.clone());
    info!("PDF generated successfully: {}", shown.display());
    Ok(())
}
