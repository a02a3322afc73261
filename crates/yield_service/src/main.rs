//! Crop yield prediction server

use anyhow::{Context, Result};
use clap::Parser;
use cropyield_service::{start_server, AppState, Predictor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "cropyield-service")]
#[command(about = "Crop yield prediction server")]
#[command(version)]
struct Cli {
    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Trained model artifact
    #[arg(long, default_value = "crop_yield_model.bin")]
    model: PathBuf,

    /// Column manifest written by the trainer
    #[arg(long, default_value = "model_columns.json")]
    columns: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // Failing here means the server never starts serving
    let predictor = Predictor::load(&cli.model, &cli.columns)?;
    info!(
        "Model ready: {} trees, {} columns",
        predictor.model().trees.len(),
        predictor.manifest().len()
    );

    let state = AppState::new(Arc::new(predictor));
    let addr = format!("{}:{}", cli.host, cli.port);
    start_server(state, &addr).await
}
