// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use article_pdf::cli::{execute, Cli};
use article_pdf::config::load_env;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    // .env feeds both RUST_LOG and the clap env fallbacks
    load_env(None);
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute the command
    match execute(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
