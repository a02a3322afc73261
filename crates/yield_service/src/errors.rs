//! Prediction request errors

use cropyield_core::CoreError;
use thiserror::Error;

/// Failures surfaced to the client. None of them stop the service.
#[derive(Error, Debug)]
pub enum PredictError {
    /// Missing, empty or unparsable payload
    #[error("{0}")]
    BadRequest(String),

    /// The encoded row cannot be aligned to the manifest
    #[error("Column mismatch: missing columns [{}]", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// Model evaluation failed for any other reason
    #[error("{0}")]
    Prediction(String),
}

impl From<CoreError> for PredictError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SchemaMismatch { missing } => PredictError::SchemaMismatch { missing },
            other => PredictError::Prediction(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_are_classified() {
        let mismatch = CoreError::SchemaMismatch {
            missing: vec!["State_Goa".to_string()],
        };
        assert!(matches!(
            PredictError::from(mismatch),
            PredictError::SchemaMismatch { .. }
        ));

        let model = CoreError::Model("expected 14 features, got 3".to_string());
        let err = PredictError::from(model);
        assert!(matches!(err, PredictError::Prediction(_)));
        assert!(err.to_string().contains("expected 14 features"));
    }
}
