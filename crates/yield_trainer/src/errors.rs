use cropyield_core::CoreError;
use thiserror::Error;

/// Errors returned by the generator and the forest trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("training error: {0}")]
    Training(String),

    #[error(transparent)]
    Schema(#[from] CoreError),
}
