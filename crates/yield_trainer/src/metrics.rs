//! Validation metrics reported after training

use cropyield_core::{ForestModel, SCALE};
use serde::{Deserialize, Serialize};

use crate::dataset::EncodedTable;
use crate::errors::TrainerError;

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    total / actual.len() as f64
}

/// Coefficient of determination. A constant target scores 1.0 when
/// predicted perfectly and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub samples: usize,
    pub mae: f64,
    pub r2: f64,
}

/// Score `model` on a fixed-point table, in real units
pub fn evaluate(model: &ForestModel, table: &EncodedTable) -> Result<ValidationReport, TrainerError> {
    let scale = SCALE as f64;
    let mut actual = Vec::with_capacity(table.len());
    let mut predicted = Vec::with_capacity(table.len());

    for (row, &target) in table.features.iter().zip(&table.targets) {
        predicted.push(model.predict_scaled(row)? / scale);
        actual.push(target as f64 / scale);
    }

    Ok(ValidationReport {
        samples: table.len(),
        mae: mean_absolute_error(&actual, &predicted),
        r2: r2_score(&actual, &predicted),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mae() {
        let actual = [3.0, -0.5, 2.0, 7.0];
        let predicted = [2.5, 0.0, 2.0, 8.0];
        assert!((mean_absolute_error(&actual, &predicted) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_r2() {
        let actual = [3.0, -0.5, 2.0, 7.0];
        let predicted = [2.5, 0.0, 2.0, 8.0];
        assert!((r2_score(&actual, &predicted) - 0.948_608_137_044_967_9).abs() < 1e-9);
        assert_eq!(r2_score(&actual, &actual), 1.0);
    }

    #[test]
    fn test_constant_target() {
        assert_eq!(r2_score(&[4.0, 4.0], &[4.0, 4.0]), 1.0);
        assert_eq!(r2_score(&[4.0, 4.0], &[3.0, 4.0]), 0.0);
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
    }
}
