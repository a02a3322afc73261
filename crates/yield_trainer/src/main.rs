//! Crop yield CLI
//!
//! `generate` writes the synthetic dataset, `train` fits the forest and
//! writes the model and column manifest consumed by the prediction service.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cropyield_trainer::{
    generate_to_path, save_artifacts, train_model_from_csv, ForestConfig, GeneratorConfig,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "cropyield")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Synthetic crop yield data generator and forest trainer", long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the synthetic dataset CSV
    Generate(GenerateArgs),
    /// Train the forest and write model + column manifest
    Train(TrainArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Number of rows
    #[arg(long, default_value = "1000")]
    rows: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: i64,

    /// Output CSV path
    #[arg(short, long, default_value = "crop_yield_dataset.csv")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Input CSV dataset path
    #[arg(short, long, default_value = "crop_yield_dataset.csv")]
    input: PathBuf,

    /// Output model path (a `.hash` sidecar is written next to it)
    #[arg(long, default_value = "crop_yield_model.bin")]
    model: PathBuf,

    /// Output column manifest path
    #[arg(long, default_value = "model_columns.json")]
    columns: PathBuf,

    /// Number of trees
    #[arg(long, default_value = "100")]
    trees: usize,

    /// Maximum tree depth
    #[arg(long, default_value = "16")]
    max_depth: usize,

    /// Minimum samples per leaf
    #[arg(long, default_value = "1")]
    min_samples_leaf: usize,

    /// Random seed for the split and bootstrap sampling
    #[arg(long, default_value = "42")]
    seed: i64,
}

fn main() -> Result<()> {
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

    match cli.command {
        Commands::Generate(args) => run_generate(args),
        Commands::Train(args) => run_train(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = GeneratorConfig {
        rows: args.rows,
        seed: args.seed,
    };
    generate_to_path(&config, &args.output)?;
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    info!("Crop yield trainer v{}", env!("CARGO_PKG_VERSION"));
    info!("Loading dataset from: {}", args.input.display());

    let config = ForestConfig {
        num_trees: args.trees,
        max_depth: args.max_depth,
        min_samples_leaf: args.min_samples_leaf,
        seed: args.seed,
        ..ForestConfig::default()
    };

    info!("Training configuration:");
    info!("  Trees: {}", config.num_trees);
    info!("  Max depth: {}", config.max_depth);
    info!("  Min samples per leaf: {}", config.min_samples_leaf);
    info!("  Seed: {}", config.seed);

    let outcome = train_model_from_csv(&args.input, config).context("Training failed")?;

    info!("Trained on {} rows", outcome.train_rows);
    info!("Feature columns ({}):", outcome.manifest.len());
    for (i, column) in outcome.manifest.columns().iter().enumerate() {
        info!("  {}: {}", i, column);
    }
    info!("Validation MAE: {:.2}", outcome.report.mae);
    info!("Validation R^2: {:.2}", outcome.report.r2);

    let hash = save_artifacts(&outcome, &args.model, &args.columns)
        .context("Failed to write artifacts")?;

    info!("Model saved to {} ({})", args.model.display(), hash);
    info!("Columns saved to {}", args.columns.display());

    Ok(())
}
