use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::app::AppState;
use crate::classify::{BackendId, ClassificationResult};

use super::{ErrorBody, error_response};

#[derive(Debug, Deserialize)]
pub(crate) struct PredictRequest {
    method: String,
    url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictResponse {
    predictions: Vec<ClassificationResult>,
}

pub(crate) async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, (StatusCode, Json<ErrorBody>)> {
    let backend = request.method.parse::<BackendId>().map_err(|error| {
        warn!(method = %request.method, "unknown prediction backend requested");
        error_response(&error)
    })?;

    let predictions = state
        .service()
        .classify(&request.url, backend)
        .await
        .map_err(|error| {
            warn!(backend = %backend, url = %request.url, error = %error, "prediction failed");
            error_response(&error)
        })?;

    Ok(Json(PredictResponse { predictions }))
}
