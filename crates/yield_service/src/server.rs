//! HTTP surface of the prediction service
//!
//! `GET /` liveness, `GET /health` model summary, `POST /predict` inference.
//! Every request failure becomes a 400 with a JSON `error` body.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::errors::PredictError;
use crate::predictor::Predictor;
use crate::request::PredictRequest;

/// Liveness text returned by `GET /`
pub const LIVENESS_MESSAGE: &str = "Crop yield prediction server is running.";

/// Read-only state shared by every request
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(predictor: Arc<Predictor>) -> Self {
        Self {
            predictor,
            start_time: Instant::now(),
        }
    }

    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    feature_count: usize,
    tree_count: usize,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_yield: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        // every request-level failure is the client's 400
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = bind_listener(addr).await?;
    info!("Prediction server listening on {}", addr);
    axum::serve(listener, app)
        .await
        .context("Prediction server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route("/health", get(handle_health))
        .route("/predict", post(handle_predict))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_home() -> &'static str {
    LIVENESS_MESSAGE
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let model = state.predictor.model();
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_seconds(),
        feature_count: model.feature_count(),
        tree_count: model.trees.len(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn handle_predict(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    debug!("Raw request data: {}", String::from_utf8_lossy(&body));

    let request = PredictRequest::from_body(&body).map_err(|err| {
        warn!("Rejected payload: {}", err);
        ApiError::from(err)
    })?;
    debug!("Parsed request: {:?}", request);

    let predicted_yield = state.predictor.predict(&request).map_err(|err| {
        warn!("Prediction failed: {}", err);
        ApiError::from(err)
    })?;

    Ok(Json(PredictResponse { predicted_yield }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_is_bad_request() {
        let err = ApiError::from(PredictError::SchemaMismatch {
            missing: vec!["State_Goa".to_string()],
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Column mismatch: missing columns [State_Goa]");

        let response = ApiError::from(PredictError::Prediction("boom".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
