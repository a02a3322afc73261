//! Single-row inference over an immutable model and manifest.

use anyhow::{Context, Result};
use cropyield_core::{climate_for_state, encode, ColumnManifest, EncodedRow, FeatureInput, ForestModel};
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::PredictError;
use crate::request::PredictRequest;

/// `Year` value used for every request
pub const INFERENCE_YEAR: f64 = 2024.0;

/// Loaded model plus the manifest it was trained with
#[derive(Debug, Clone)]
pub struct Predictor {
    model: ForestModel,
    manifest: ColumnManifest,
}

impl Predictor {
    /// Pair a model with its manifest, refusing malformed trees and
    /// artifacts from different runs
    pub fn new(model: ForestModel, manifest: ColumnManifest) -> Result<Self, PredictError> {
        model.validate()?;
        model.check_manifest(&manifest)?;

        if let Err(err) = manifest.validate() {
            warn!("Manifest cannot be satisfied by the encoder: {}", err);
        }

        Ok(Self { model, manifest })
    }

    /// Load both artifacts from disk
    pub fn load(model_path: &Path, columns_path: &Path) -> Result<Self> {
        let model = ForestModel::load(model_path)
            .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
        let manifest = ColumnManifest::load(columns_path)
            .with_context(|| format!("Failed to load columns from {}", columns_path.display()))?;

        let predictor = Self::new(model, manifest).context("Model and columns are not paired")?;
        debug!(
            "Loaded model with {} trees over {} columns",
            predictor.model.trees.len(),
            predictor.manifest.len()
        );
        Ok(predictor)
    }

    pub fn model(&self) -> &ForestModel {
        &self.model
    }

    pub fn manifest(&self) -> &ColumnManifest {
        &self.manifest
    }

    /// Feature-engineer a request: climate by state, fixed year, one-hot categories
    pub fn encode(&self, request: &PredictRequest) -> EncodedRow {
        let climate = climate_for_state(&request.state);

        encode(&FeatureInput {
            state: &request.state,
            crop_type: &request.crop_type,
            year: INFERENCE_YEAR,
            land_size: request.land_size,
            fertilizer: request.fertilizer,
            pesticide: request.pesticide,
            avg_temperature: climate.avg_temperature,
            annual_rainfall: climate.annual_rainfall,
        })
    }

    /// Predicted yield in kg/ha, rounded to two decimals
    pub fn predict(&self, request: &PredictRequest) -> Result<f64, PredictError> {
        let row = self.encode(request);
        let aligned = self.manifest.align(&row)?;
        debug!("Aligned input: {:?}", aligned);

        let raw = self.model.predict(&aligned)?;
        if !raw.is_finite() {
            return Err(PredictError::Prediction(format!(
                "model returned a non-finite value: {raw}"
            )));
        }

        Ok((raw * 100.0).round() / 100.0)
    }
}
