//! Prediction request payload.
//!
//! Numeric fields are coerced leniently: anything that is not a usable
//! number becomes 0.0 instead of rejecting the request. Categorical fields
//! that are not strings are treated as empty, which the encoder maps to an
//! all-zero indicator family.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::PredictError;

const NO_PAYLOAD: &str = "No JSON payload received";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub crop_type: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub land_size: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fertilizer: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pesticide: f64,
    /// Accepted and logged, not a model feature
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: f64,
    /// Accepted and logged, not a model feature
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub state: String,
}

/// Safe-float coercion of an arbitrary JSON value
pub fn safe_float(value: &Value) -> f64 {
    let coerced = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        Value::Bool(false) => 0.0,
        _ => 0.0,
    };

    // "NaN" and "inf" parse, but a non-finite feature would fail the whole
    // request; they get the same 0.0 as any other unusable value
    if coerced.is_finite() {
        coerced
    } else {
        0.0
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(safe_float(&value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// JSON values that count as "no payload"
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

impl PredictRequest {
    /// Parse a raw request body
    pub fn from_body(body: &[u8]) -> Result<Self, PredictError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(PredictError::BadRequest(NO_PAYLOAD.to_string()));
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|err| PredictError::BadRequest(format!("Invalid JSON payload: {err}")))?;

        if is_empty_payload(&value) {
            return Err(PredictError::BadRequest(NO_PAYLOAD.to_string()));
        }
        if !value.is_object() {
            return Err(PredictError::BadRequest(
                "JSON payload must be an object".to_string(),
            ));
        }

        serde_json::from_value(value)
            .map_err(|err| PredictError::BadRequest(format!("Invalid JSON payload: {err}")))
    }
}
