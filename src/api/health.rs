use axum::{Json, extract::State};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct HealthReport {
    status: &'static str,
    tagger_count: usize,
    registered_backends: Vec<&'static str>,
}

pub(crate) async fn live(State(state): State<AppState>) -> Json<HealthReport> {
    state.telemetry().record_live_probe();
    Json(state.health_report("live"))
}

pub(crate) async fn ready(State(state): State<AppState>) -> Json<HealthReport> {
    state.telemetry().record_ready_probe();
    Json(state.health_report("ready"))
}

impl AppState {
    fn health_report(&self, status: &'static str) -> HealthReport {
        HealthReport {
            status,
            tagger_count: self.service().resolver().tagger_count(),
            registered_backends: self.registered_backends(),
        }
    }
}
