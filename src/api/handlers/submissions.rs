use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{AppState, internal_error};
use crate::api::models::{DeleteParams, DeleteResponse};
use crate::errors::SubmissionError;
use crate::services::submissions::{NewSubmission, SubmissionReceipt};

fn submission_error(e: SubmissionError) -> Response {
    match e {
        SubmissionError::Invalid(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response(),
        SubmissionError::UnknownCollection(_) | SubmissionError::UnknownGroup { .. } => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        SubmissionError::Storage(e) => internal_error(e),
    }
}

pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewSubmission>,
) -> Response {
    match state.submissions.submit(request) {
        Ok(stored) => (StatusCode::CREATED, Json(SubmissionReceipt::from(&stored))).into_response(),
        Err(e) => submission_error(e),
    }
}

pub async fn delete_submissions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteParams>,
) -> Response {
    match state
        .submissions
        .delete(&params.collection, &params.group, &params.username)
    {
        Ok(deleted) => Json(DeleteResponse { deleted }).into_response(),
        Err(e) => submission_error(e),
    }
}
