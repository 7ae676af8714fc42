use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{AppState, internal_error};
use crate::analytics::AnalysisKind;
use crate::api::models::{CollectionParams, ConsensusParams, GroupParams, HeadToHeadParams, OshiParams, UserParams};
use crate::services::analysis::AnalysisEnvelope;

fn respond(result: anyhow::Result<AnalysisEnvelope>) -> Response {
    match result {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) => internal_error(e),
    }
}

fn respond_or_404(result: anyhow::Result<Option<AnalysisEnvelope>>, missing: String) -> Response {
    match result {
        Ok(Some(envelope)) => Json(envelope).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, missing).into_response(),
        Err(e) => internal_error(e),
    }
}

fn group_kind(state: &AppState, params: &GroupParams, kind: AnalysisKind) -> Response {
    respond(state.analysis.group_analysis(&params.collection, &params.group, kind))
}

pub async fn get_rankings(State(state): State<Arc<AppState>>, Query(params): Query<GroupParams>) -> Response {
    group_kind(&state, &params, AnalysisKind::CommunityRank)
}

pub async fn get_divergence(State(state): State<Arc<AppState>>, Query(params): Query<GroupParams>) -> Response {
    group_kind(&state, &params, AnalysisKind::Divergence)
}

pub async fn get_controversy(State(state): State<Arc<AppState>>, Query(params): Query<GroupParams>) -> Response {
    group_kind(&state, &params, AnalysisKind::Controversy)
}

pub async fn get_hot_takes(State(state): State<Arc<AppState>>, Query(params): Query<GroupParams>) -> Response {
    group_kind(&state, &params, AnalysisKind::Takes)
}

pub async fn get_most_disputed(State(state): State<Arc<AppState>>, Query(params): Query<GroupParams>) -> Response {
    group_kind(&state, &params, AnalysisKind::Disputed)
}

pub async fn get_outliers(State(state): State<Arc<AppState>>, Query(params): Query<GroupParams>) -> Response {
    group_kind(&state, &params, AnalysisKind::Outliers)
}

pub async fn get_comebacks(State(state): State<Arc<AppState>>, Query(params): Query<GroupParams>) -> Response {
    group_kind(&state, &params, AnalysisKind::Comebacks)
}

pub async fn get_subunits(State(state): State<Arc<AppState>>, Query(params): Query<GroupParams>) -> Response {
    group_kind(&state, &params, AnalysisKind::Subunits)
}

pub async fn get_conformity(State(state): State<Arc<AppState>>, Query(params): Query<GroupParams>) -> Response {
    group_kind(&state, &params, AnalysisKind::Conformity)
}

pub async fn get_consensus(State(state): State<Arc<AppState>>, Query(params): Query<ConsensusParams>) -> Response {
    respond(state.analysis.consensus(&params.collection, &params.group, params.limit))
}

pub async fn get_spice(State(state): State<Arc<AppState>>, Query(params): Query<CollectionParams>) -> Response {
    respond(state.analysis.spice(&params.collection))
}

pub async fn get_head_to_head(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HeadToHeadParams>,
) -> Response {
    respond_or_404(
        state
            .analysis
            .head_to_head(&params.collection, &params.group, &params.user_a, &params.user_b),
        format!("No shared rankings for {} and {}", params.user_a, params.user_b),
    )
}

pub async fn get_user_match(State(state): State<Arc<AppState>>, Query(params): Query<UserParams>) -> Response {
    respond_or_404(
        state.analysis.user_match(&params.collection, &params.group, &params.user),
        format!("User {} not found", params.user),
    )
}

pub async fn get_oshi_bias(State(state): State<Arc<AppState>>, Query(params): Query<OshiParams>) -> Response {
    respond_or_404(
        state.analysis.oshi_bias(&params.collection, &params.user),
        format!("No valid submission for {}", params.user),
    )
}
