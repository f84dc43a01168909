pub(crate) mod entities;
pub(crate) mod health;
pub(crate) mod metrics;
pub(crate) mod predict;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use crate::app::AppState;
use crate::errors::SignalError;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(metrics::exporter))
        .route("/v1/predict", post(predict::predict))
        .route("/v1/entities", post(entities::entities))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    error: String,
}

pub(crate) fn error_response(error: &SignalError) -> (StatusCode, Json<ErrorBody>) {
    let status = match error {
        SignalError::InvalidResource(_) => StatusCode::BAD_REQUEST,
        SignalError::Upstream(_) => StatusCode::BAD_GATEWAY,
        SignalError::BackendUnimplemented(_) => StatusCode::NOT_IMPLEMENTED,
        SignalError::TaxonomyMismatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorBody {
            error: format!("{error:#}"),
        }),
    )
}
