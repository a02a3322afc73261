//! Column manifest
//!
//! The ordered list of feature names a model was fitted on. The model reads a
//! positional vector, so the manifest is the only thing that ties a column
//! name to a slot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::errors::{CoreError, Result};
use crate::schema::{self, crop_column, state_column, EncodedRow, NUMERIC_COLUMNS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnManifest {
    columns: Vec<String>,
}

impl ColumnManifest {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Derive the training manifest from the categorical values seen in the data.
    ///
    /// Numerics come first, then one indicator per distinct state and per
    /// distinct crop type, each family sorted by value. Values the encoder
    /// cannot produce are rejected here instead of at inference time.
    pub fn from_observed<'a, S, C>(states: S, crops: C) -> Result<Self>
    where
        S: IntoIterator<Item = &'a str>,
        C: IntoIterator<Item = &'a str>,
    {
        let states: BTreeSet<&str> = states.into_iter().collect();
        let crops: BTreeSet<&str> = crops.into_iter().collect();

        let columns: Vec<String> = NUMERIC_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(states.into_iter().map(state_column))
            .chain(crops.into_iter().map(crop_column))
            .collect();

        let manifest = Self { columns };
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Fail with `SchemaMismatch` if any column is beyond the encoder's reach
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !schema::is_producible(c))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::SchemaMismatch { missing })
        }
    }

    /// Select the manifest's columns from an encoded row, in manifest order
    pub fn align(&self, row: &EncodedRow) -> Result<Vec<f64>> {
        let mut values = Vec::with_capacity(self.columns.len());
        let mut missing = Vec::new();

        for column in &self.columns {
            match row.get(column) {
                Some(value) => values.push(value),
                None => missing.push(column.clone()),
            }
        }

        if missing.is_empty() {
            Ok(values)
        } else {
            Err(CoreError::SchemaMismatch { missing })
        }
    }

    /// BLAKE3 hex digest of the serialized manifest
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.columns)?;
        Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let manifest: Self = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded manifest with {} columns from {}",
            manifest.len(),
            path.as_ref().display()
        );
        Ok(manifest)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string(&self.columns)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{encode, FeatureInput};
    use crate::STATES;

    fn full_manifest() -> ColumnManifest {
        ColumnManifest::from_observed(
            STATES.iter().map(|p| p.name),
            ["Rice", "Wheat", "Maize"],
        )
        .expect("known vocabulary")
    }

    fn punjab_rice() -> EncodedRow {
        encode(&FeatureInput {
            state: "Punjab",
            crop_type: "Rice",
            year: 2024.0,
            land_size: 5.0,
            fertilizer: 100.0,
            pesticide: 10.0,
            avg_temperature: 25.0,
            annual_rainfall: 650.0,
        })
    }

    #[test]
    fn test_observed_order() {
        let manifest = full_manifest();
        let expected = [
            "Year",
            "LandSize(ha)",
            "FertilizerUsage(kg_ha)",
            "PesticideUsage(kg_ha)",
            "AvgTemperature(C)",
            "AnnualRainfall(mm)",
            "State_Haryana",
            "State_Maharashtra",
            "State_Punjab",
            "State_Uttar Pradesh",
            "State_West Bengal",
            "CropType_Maize",
            "CropType_Rice",
            "CropType_Wheat",
        ];
        assert_eq!(manifest.columns(), expected);
    }

    #[test]
    fn test_observed_subset() {
        let manifest =
            ColumnManifest::from_observed(["Punjab", "Punjab"], ["Wheat"]).expect("subset");
        assert_eq!(manifest.len(), 8);
        assert_eq!(manifest.columns()[6], "State_Punjab");
        assert_eq!(manifest.columns()[7], "CropType_Wheat");
    }

    #[test]
    fn test_unknown_training_value_rejected() {
        let err = ColumnManifest::from_observed(["Punjab", "Goa"], ["Rice"]).unwrap_err();
        match err {
            CoreError::SchemaMismatch { missing } => assert_eq!(missing, vec!["State_Goa"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_align_follows_manifest_order() {
        let manifest = full_manifest();
        let values = manifest.align(&punjab_rice()).expect("aligned");
        assert_eq!(values.len(), 14);
        assert_eq!(values[0], 2024.0);
        assert_eq!(values[8], 1.0); // State_Punjab
        assert_eq!(values[12], 1.0); // CropType_Rice
        assert_eq!(values.iter().skip(6).sum::<f64>(), 2.0);
    }

    #[test]
    fn test_align_reports_missing_columns() {
        let manifest = ColumnManifest::new(vec![
            "Year".to_string(),
            "State_Goa".to_string(),
            "Latitude".to_string(),
        ]);
        match manifest.align(&punjab_rice()) {
            Err(CoreError::SchemaMismatch { missing }) => {
                assert_eq!(missing, vec!["State_Goa", "Latitude"]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_save_and_load() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("model_columns.json");

        let manifest = full_manifest();
        manifest.save(&path)?;

        let raw: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(raw.len(), 14);

        let loaded = ColumnManifest::load(&path)?;
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.fingerprint()?, manifest.fingerprint()?);
        Ok(())
    }
}
