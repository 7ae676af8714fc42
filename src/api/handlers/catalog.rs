use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{AppState, internal_error};
use crate::api::models::{CollectionParams, GroupParams, GroupSummary, RankedItem, UserRanking};
use crate::database::{self, DbPool};
use crate::ranking::relativize;

/// Groups of a collection with their item names; unknown collection is empty
pub async fn get_groups(State(state): State<Arc<AppState>>, Query(params): Query<CollectionParams>) -> Response {
    match list_groups(&state.pool, &params.collection) {
        Ok(groups) => Json(groups).into_response(),
        Err(e) => internal_error(e),
    }
}

/// Each user's latest ranking, relativized to the group
pub async fn get_user_rankings(State(state): State<Arc<AppState>>, Query(params): Query<GroupParams>) -> Response {
    match list_user_rankings(&state.pool, &params.collection, &params.group) {
        Ok(rankings) => Json(rankings).into_response(),
        Err(e) => internal_error(e),
    }
}

fn list_groups(pool: &DbPool, collection: &str) -> Result<Vec<GroupSummary>> {
    let conn = database::get_connection(pool)?;
    let Some(collection) = database::collections::find_by_name(&conn, collection)? else {
        return Ok(Vec::new());
    };
    let names = database::items::name_map(&conn, collection.id)?;

    let groups = database::groups::list_by_collection(&conn, collection.id)?
        .into_iter()
        .map(|group| GroupSummary {
            item_count: group.size(),
            items: group.item_ids.iter().filter_map(|id| names.get(id).cloned()).collect(),
            id: group.id,
            name: group.name,
            collection: collection.name.clone(),
            is_subunit: group.is_subunit,
        })
        .collect();
    Ok(groups)
}

fn list_user_rankings(pool: &DbPool, collection: &str, group: &str) -> Result<Vec<UserRanking>> {
    let conn = database::get_connection(pool)?;
    let Some(collection) = database::collections::find_by_name(&conn, collection)? else {
        return Ok(Vec::new());
    };
    let Some(group) = database::groups::find_by_name(&conn, collection.id, group)? else {
        return Ok(Vec::new());
    };
    let names = database::items::name_map(&conn, collection.id)?;
    let items = group.item_set();

    let latest = database::submissions::latest_valid_per_group(&conn, collection.id)?;
    let rankings = database::submissions::snapshot_for_group(&latest, &group)
        .into_iter()
        .filter_map(|submission| {
            let relative = relativize(&submission.rankings, &items);
            if relative.is_empty() {
                return None;
            }
            let mut rankings: Vec<RankedItem> = relative
                .into_iter()
                .map(|(item_id, rank)| RankedItem {
                    item_id,
                    item_name: names.get(&item_id).cloned().unwrap_or_else(|| "Unknown".to_string()),
                    rank,
                })
                .collect();
            rankings.sort_by(|a, b| a.rank.total_cmp(&b.rank).then(a.item_id.cmp(&b.item_id)));
            Some(UserRanking {
                username: submission.username,
                rankings,
            })
        })
        .collect();
    Ok(rankings)
}
