//! Crop yield trainer
//!
//! Generates the synthetic crop yield dataset and fits a deterministic
//! bagged regression forest on it, persisting the model together with the
//! column manifest it was fitted with.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod generator;
pub mod metrics;
pub mod trainer;

use cropyield_core::{ColumnManifest, ForestModel};
use std::path::Path;

pub use dataset::{Dataset, EncodedTable, YieldRecord, CSV_COLUMNS};
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::TrainerError;
pub use generator::{generate_to_path, write_dataset, DataGenerator, GeneratorConfig};
pub use metrics::ValidationReport;
pub use trainer::{ForestConfig, ForestTrainer};

/// Share of rows held out for validation
pub const VALIDATION_FRACTION: f64 = 0.2;

/// Everything one training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: ForestModel,
    pub manifest: ColumnManifest,
    pub report: ValidationReport,
    pub train_rows: usize,
}

/// Encode, split, fit and validate.
///
/// The validation metrics are recorded in the model metadata; they are
/// informational and never fail the run.
pub fn train_dataset(dataset: &Dataset, config: ForestConfig) -> Result<TrainingOutcome, TrainerError> {
    let manifest = dataset.manifest()?;
    let table = dataset.encode(&manifest)?;

    for (column, (min, max)) in manifest.columns().iter().zip(table.feature_stats()) {
        tracing::debug!("  {}: min={}, max={}", column, min, max);
    }

    let (train, validation) = table.train_test_split(VALIDATION_FRACTION, config.seed);
    tracing::info!(
        "Split {} rows into {} train / {} validation",
        table.len(),
        train.len(),
        validation.len()
    );

    let trainer = ForestTrainer::new(config);
    let mut model = trainer.train(&train, &manifest)?;

    let report = if validation.is_empty() {
        tracing::warn!("No validation rows; skipping evaluation");
        ValidationReport {
            samples: 0,
            mae: f64::NAN,
            r2: f64::NAN,
        }
    } else {
        let report = metrics::evaluate(&model, &validation)?;
        let recorded = &mut model.metadata.performance_metrics;
        recorded.insert("validation_mae".to_string(), report.mae);
        recorded.insert("validation_r2".to_string(), report.r2);
        report
    };

    Ok(TrainingOutcome {
        model,
        manifest,
        report,
        train_rows: train.len(),
    })
}

/// Train a model directly from a CSV file using the provided parameters.
pub fn train_model_from_csv(path: &Path, config: ForestConfig) -> Result<TrainingOutcome, TrainerError> {
    let dataset = Dataset::from_csv(path).map_err(|err| TrainerError::Dataset(format!("{err:#}")))?;
    train_dataset(&dataset, config)
}

/// Write the model (plus `.hash` sidecar) and the manifest; returns the model hash
pub fn save_artifacts(
    outcome: &TrainingOutcome,
    model_path: &Path,
    columns_path: &Path,
) -> Result<String, TrainerError> {
    outcome.manifest.save(columns_path)?;
    let hash = outcome.model.save(model_path)?;
    Ok(hash)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
