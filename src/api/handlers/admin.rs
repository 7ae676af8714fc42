use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::sync::Arc;

use super::AppState;
use crate::api::models::TriggerResponse;
use crate::errors::RecomputeError;

/// Start a full recomputation in the background; 409 while one is running
pub async fn trigger_recompute(State(state): State<Arc<AppState>>) -> Response {
    let guard = match state.orchestrator.begin() {
        Ok(guard) => guard,
        Err(RecomputeError::AlreadyRunning) => {
            return (
                StatusCode::CONFLICT,
                "Analysis recomputation is already in progress. Please wait.",
            )
                .into_response();
        }
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::task::spawn_blocking(move || {
        log::info!("Admin triggered recompute started");
        match orchestrator.run(guard) {
            Ok(summary) => log::info!("Admin triggered recompute completed: {:?}", summary),
            Err(e) => log::error!("Admin triggered recompute failed: {:?}", e),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(TriggerResponse {
            status: "accepted".to_string(),
            message: "Analysis recomputation started in the background.".to_string(),
            timestamp: Utc::now().naive_utc(),
        }),
    )
        .into_response()
}
