use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::state::AppState;
use crate::application::IndexStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub index: IndexStatus,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Always ready to accept uploads; `index.loaded` says whether questions can
/// be answered yet.
pub async fn readiness_check(State(state): State<AppState>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready".into(),
        index: state.index.status().await,
    })
}
