//! Crop yield prediction service
//!
//! Loads the forest and its column manifest once, then answers
//! `POST /predict` by feature-engineering each request into the manifest's
//! positional vector.

pub mod errors;
pub mod predictor;
pub mod request;
pub mod server;

pub use errors::PredictError;
pub use predictor::{Predictor, INFERENCE_YEAR};
pub use request::{safe_float, PredictRequest};
pub use server::{build_router, start_server, AppState, PredictResponse, LIVENESS_MESSAGE};
