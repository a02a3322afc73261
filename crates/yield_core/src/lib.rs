//! Crop yield core
//!
//! Shared pieces of the training/inference contract: the climate table, the
//! feature encoder, the column manifest and the forest model artifact.

pub mod climate;
pub mod errors;
pub mod forest;
pub mod manifest;
pub mod schema;

pub use climate::{climate_for_state, state_profile, Climate, StateProfile, DEFAULT_CLIMATE, STATES};
pub use errors::{CoreError, Result};
pub use forest::{quantize, ForestModel, ModelMetadata, Node, Tree};
pub use manifest::ColumnManifest;
pub use schema::{encode, CropType, EncodedRow, FeatureInput};

/// Fixed-point scale used by the forest (two decimal places).
pub const SCALE: i64 = 100;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
