use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::AppState;
use crate::api::models::HealthResponse;
use crate::database;

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let database_ok = database::get_connection(&state.pool)
        .and_then(|conn| Ok(conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?))
        .is_ok();

    let status = if database_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = HealthResponse {
        status: if database_ok { "ok" } else { "degraded" }.to_string(),
        database: if database_ok { "ok" } else { "unreachable" }.to_string(),
        recompute_running: state.orchestrator.is_running(),
    };
    (status, Json(body)).into_response()
}
