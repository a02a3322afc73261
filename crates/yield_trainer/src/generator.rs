//! Synthetic crop yield dataset generator
//!
//! Draws rows from a closed-form yield formula with uniform noise. All
//! randomness comes from [`LcgRng`], so a given seed always produces the
//! same bytes.

use anyhow::{Context, Result};
use cropyield_core::{CropType, STATES};
use std::io::Write;
use std::path::Path;

use crate::dataset::YieldRecord;
use crate::deterministic::LcgRng;

/// Yield floor and ceiling in kg/ha
pub const MIN_YIELD: f64 = 800.0;
pub const MAX_YIELD: f64 = 8000.0;

/// Temperature with no penalty
const OPTIMAL_TEMPERATURE: f64 = 25.0;
/// Rainfall with no penalty
const OPTIMAL_RAINFALL: f64 = 800.0;

const FIRST_YEAR: i32 = 2015;
const LAST_YEAR: i32 = 2024;

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub rows: usize,
    pub seed: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 1000,
            seed: 42,
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Closed-form yield with noise and clamping. Inputs are the rounded values.
pub fn synthesize_yield(
    rng: &mut LcgRng,
    crop: CropType,
    fertilizer: f64,
    pesticide: f64,
    avg_temperature: f64,
    annual_rainfall: f64,
) -> f64 {
    let mut value = crop.base_yield()
        + 0.5 * fertilizer
        + 1.0 * pesticide
        - 10.0 * (avg_temperature - OPTIMAL_TEMPERATURE).abs()
        - 0.5 * (annual_rainfall - OPTIMAL_RAINFALL).abs();

    value += rng.uniform(-200.0, 200.0);

    if value < MIN_YIELD {
        value = MIN_YIELD + rng.uniform(0.0, 100.0);
    }
    if value > MAX_YIELD {
        value = MAX_YIELD - rng.uniform(0.0, 100.0);
    }

    value
}

pub struct DataGenerator {
    rng: LcgRng,
}

impl DataGenerator {
    pub fn new(seed: i64) -> Self {
        Self {
            rng: LcgRng::new(seed),
        }
    }

    /// Draw one row
    pub fn next_record(&mut self) -> YieldRecord {
        let rng = &mut self.rng;

        let state = rng.choose(&STATES).copied().unwrap_or(STATES[0]);

        let latitude = round_to(rng.uniform(state.lat_range.0, state.lat_range.1), 4);
        let longitude = round_to(rng.uniform(state.lon_range.0, state.lon_range.1), 4);

        let crop = rng.choose(&CropType::ALL).copied().unwrap_or(CropType::Rice);
        let year = FIRST_YEAR + rng.next_range(i64::from(LAST_YEAR - FIRST_YEAR + 1)) as i32;

        let land_size = round_to(rng.uniform(1.0, 10.0), 2);
        let fertilizer = round_to(rng.uniform(50.0, 300.0), 2);
        let pesticide = round_to(rng.uniform(1.0, 50.0), 2);

        let avg_temperature = round_to(state.climate.avg_temperature + rng.uniform(-2.0, 2.0), 2);
        let annual_rainfall =
            round_to(state.climate.annual_rainfall + rng.uniform(-100.0, 100.0), 2);

        let yield_kg_ha = synthesize_yield(
            rng,
            crop,
            fertilizer,
            pesticide,
            avg_temperature,
            annual_rainfall,
        );

        YieldRecord {
            state: state.name.to_string(),
            crop_type: crop.to_string(),
            year,
            land_size,
            fertilizer,
            pesticide,
            avg_temperature,
            annual_rainfall,
            latitude,
            longitude,
            yield_kg_ha: round_to(yield_kg_ha, 2),
        }
    }

    pub fn generate(&mut self, rows: usize) -> Vec<YieldRecord> {
        (0..rows).map(|_| self.next_record()).collect()
    }
}

/// Write `config.rows` rows as CSV (with header) to `writer`
pub fn write_dataset<W: Write>(config: &GeneratorConfig, writer: W) -> Result<usize> {
    let mut generator = DataGenerator::new(config.seed);
    let mut csv_writer = csv::Writer::from_writer(writer);

    for _ in 0..config.rows {
        csv_writer
            .serialize(generator.next_record())
            .context("Failed to write dataset row")?;
    }
    csv_writer.flush().context("Failed to flush dataset")?;

    Ok(config.rows)
}

/// Generate a dataset file at `path`
pub fn generate_to_path<P: AsRef<Path>>(config: &GeneratorConfig, path: P) -> Result<usize> {
    let file = std::fs::File::create(path.as_ref())
        .with_context(|| format!("Failed to create {}", path.as_ref().display()))?;
    let rows = write_dataset(config, std::io::BufWriter::new(file))?;
    tracing::info!(
        "Synthetic dataset generated: {} ({} rows, seed {})",
        path.as_ref().display(),
        rows,
        config.seed
    );
    Ok(rows)
}
