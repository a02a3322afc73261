//! CSV dataset loading and preprocessing
//!
//! Reads the generated crop yield CSV, encodes every row through the shared
//! feature encoder, quantizes to fixed-point, and provides a deterministic
//! train/validation split.

use anyhow::{Context, Result};
use cropyield_core::schema;
use cropyield_core::{encode, quantize, ColumnManifest, CoreError, FeatureInput, SCALE};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use crate::deterministic::xxhash64_i64;

/// One row of the dataset file, columns in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldRecord {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "CropType")]
    pub crop_type: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "LandSize(ha)")]
    pub land_size: f64,
    #[serde(rename = "FertilizerUsage(kg_ha)")]
    pub fertilizer: f64,
    #[serde(rename = "PesticideUsage(kg_ha)")]
    pub pesticide: f64,
    #[serde(rename = "AvgTemperature(C)")]
    pub avg_temperature: f64,
    #[serde(rename = "AnnualRainfall(mm)")]
    pub annual_rainfall: f64,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Yield(kg_ha)")]
    pub yield_kg_ha: f64,
}

impl YieldRecord {
    /// Encoder input for this row. Latitude and longitude are not features.
    pub fn feature_input(&self) -> FeatureInput<'_> {
        FeatureInput {
            state: &self.state,
            crop_type: &self.crop_type,
            year: f64::from(self.year),
            land_size: self.land_size,
            fertilizer: self.fertilizer,
            pesticide: self.pesticide,
            avg_temperature: self.avg_temperature,
            annual_rainfall: self.annual_rainfall,
        }
    }
}

/// Raw dataset as read from CSV
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub records: Vec<YieldRecord>,
}

impl Dataset {
    /// Load dataset from a CSV file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())
            .with_context(|| format!("Failed to open {}", path.as_ref().display()))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);

        let mut records = Vec::new();
        for (line_idx, row) in csv_reader.deserialize::<YieldRecord>().enumerate() {
            // header is line 1
            let record = row.with_context(|| format!("Line {}: invalid record", line_idx + 2))?;
            records.push(record);
        }

        if records.is_empty() {
            anyhow::bail!("Dataset is empty");
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Manifest from the categorical values present in this dataset
    pub fn manifest(&self) -> Result<ColumnManifest, CoreError> {
        ColumnManifest::from_observed(
            self.records.iter().map(|r| r.state.as_str()),
            self.records.iter().map(|r| r.crop_type.as_str()),
        )
    }

    /// Encode, align and quantize every row against `manifest`
    pub fn encode(&self, manifest: &ColumnManifest) -> Result<EncodedTable, CoreError> {
        let mut features = Vec::with_capacity(self.records.len());
        let mut targets = Vec::with_capacity(self.records.len());

        for record in &self.records {
            let row = manifest.align(&encode(&record.feature_input()))?;
            features.push(row.iter().map(|&v| quantize(v, SCALE)).collect());
            targets.push(quantize(record.yield_kg_ha, SCALE));
        }

        Ok(EncodedTable {
            features,
            targets,
            feature_count: manifest.len(),
        })
    }
}

/// Fixed-point feature matrix and targets
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedTable {
    pub features: Vec<Vec<i64>>,
    pub targets: Vec<i64>,
    pub feature_count: usize,
}

impl EncodedTable {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Deterministic split into (train, validation).
    ///
    /// Rows are ordered by a seeded hash of their contents; the first
    /// `ceil(len * test_fraction)` rows form the validation set.
    pub fn train_test_split(&self, test_fraction: f64, seed: i64) -> (EncodedTable, EncodedTable) {
        let n = self.len();
        let n_test = ((n as f64) * test_fraction).ceil() as usize;
        let n_test = n_test.min(n);

        let mut order: Vec<(i64, usize)> = (0..n)
            .map(|i| {
                let mut key = self.features[i].clone();
                key.push(self.targets[i]);
                (xxhash64_i64(&key, seed), i)
            })
            .collect();
        order.sort_by_key(|(hash, _)| *hash);

        let pick = |indices: &[(i64, usize)]| EncodedTable {
            features: indices.iter().map(|(_, i)| self.features[*i].clone()).collect(),
            targets: indices.iter().map(|(_, i)| self.targets[*i]).collect(),
            feature_count: self.feature_count,
        };

        let (test, train) = order.split_at(n_test);
        (pick(train), pick(test))
    }

    /// (min, max) per feature column
    pub fn feature_stats(&self) -> Vec<(i64, i64)> {
        let mut stats = vec![(i64::MAX, i64::MIN); self.feature_count];

        for row in &self.features {
            for (i, &val) in row.iter().enumerate() {
                stats[i].0 = stats[i].0.min(val);
                stats[i].1 = stats[i].1.max(val);
            }
        }

        stats
    }
}

/// Header of the dataset file
pub const CSV_COLUMNS: [&str; 11] = [
    "State",
    "CropType",
    schema::YEAR,
    schema::LAND_SIZE,
    schema::FERTILIZER,
    schema::PESTICIDE,
    schema::AVG_TEMPERATURE,
    schema::ANNUAL_RAINFALL,
    schema::LATITUDE,
    schema::LONGITUDE,
    schema::TARGET,
];
