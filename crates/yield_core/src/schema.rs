//! Feature encoder
//!
//! Expands one raw observation into named numeric features: six passthrough
//! numerics plus one-hot indicators for every known state and crop type. The
//! same encoder is used to build training rows and inference rows, so the
//! only thing that can differ between the two is the column manifest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::climate::STATES;
use crate::errors::CoreError;

pub const YEAR: &str = "Year";
pub const LAND_SIZE: &str = "LandSize(ha)";
pub const FERTILIZER: &str = "FertilizerUsage(kg_ha)";
pub const PESTICIDE: &str = "PesticideUsage(kg_ha)";
pub const AVG_TEMPERATURE: &str = "AvgTemperature(C)";
pub const ANNUAL_RAINFALL: &str = "AnnualRainfall(mm)";

/// Generated but never fed to the model
pub const LATITUDE: &str = "Latitude";
pub const LONGITUDE: &str = "Longitude";

pub const TARGET: &str = "Yield(kg_ha)";

pub const STATE_PREFIX: &str = "State_";
pub const CROP_PREFIX: &str = "CropType_";

/// Passthrough numeric columns, in manifest order
pub const NUMERIC_COLUMNS: [&str; 6] = [
    YEAR,
    LAND_SIZE,
    FERTILIZER,
    PESTICIDE,
    AVG_TEMPERATURE,
    ANNUAL_RAINFALL,
];

/// Crop types known to the generator and the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CropType {
    Rice,
    Wheat,
    Maize,
}

impl CropType {
    /// Generator draw order
    pub const ALL: [CropType; 3] = [CropType::Rice, CropType::Wheat, CropType::Maize];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Rice => "Rice",
            CropType::Wheat => "Wheat",
            CropType::Maize => "Maize",
        }
    }

    /// Baseline yield in kg/ha before input and climate effects
    pub fn base_yield(&self) -> f64 {
        match self {
            CropType::Rice => 3000.0,
            CropType::Wheat => 2800.0,
            CropType::Maize => 2500.0,
        }
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CropType::ALL
            .into_iter()
            .find(|crop| crop.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCategory {
                family: "CropType",
                value: s.to_string(),
            })
    }
}

/// Raw inputs for one observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureInput<'a> {
    pub state: &'a str,
    pub crop_type: &'a str,
    pub year: f64,
    pub land_size: f64,
    pub fertilizer: f64,
    pub pesticide: f64,
    pub avg_temperature: f64,
    pub annual_rainfall: f64,
}

/// Named feature values for one observation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedRow {
    values: BTreeMap<String, f64>,
}

impl EncodedRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert(&mut self, column: impl Into<String>, value: f64) {
        self.values.insert(column.into(), value);
    }
}

pub fn state_column(state: &str) -> String {
    format!("{STATE_PREFIX}{state}")
}

pub fn crop_column(crop: &str) -> String {
    format!("{CROP_PREFIX}{crop}")
}

fn indicator(matches: bool) -> f64 {
    if matches {
        1.0
    } else {
        0.0
    }
}

/// Encode one observation.
///
/// Every known state and crop type gets its own indicator column; a value
/// outside the vocabulary simply leaves its whole family at zero.
pub fn encode(input: &FeatureInput<'_>) -> EncodedRow {
    let mut row = EncodedRow::default();

    row.insert(YEAR, input.year);
    row.insert(LAND_SIZE, input.land_size);
    row.insert(FERTILIZER, input.fertilizer);
    row.insert(PESTICIDE, input.pesticide);
    row.insert(AVG_TEMPERATURE, input.avg_temperature);
    row.insert(ANNUAL_RAINFALL, input.annual_rainfall);

    for profile in STATES {
        row.insert(state_column(profile.name), indicator(profile.name == input.state));
    }
    for crop in CropType::ALL {
        row.insert(crop_column(crop.as_str()), indicator(crop.as_str() == input.crop_type));
    }

    row
}

/// Whether [`encode`] can emit `column`
pub fn is_producible(column: &str) -> bool {
    if NUMERIC_COLUMNS.contains(&column) {
        return true;
    }
    if let Some(state) = column.strip_prefix(STATE_PREFIX) {
        return STATES.iter().any(|p| p.name == state);
    }
    if let Some(crop) = column.strip_prefix(CROP_PREFIX) {
        return crop.parse::<CropType>().is_ok();
    }
    false
}
