use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::database::{self, DbPool, Group, Submission, SubmissionStatus};
use crate::errors::SubmissionError;
use crate::ranking::{ItemId, RankMap, resolve_ties};

const USERNAME_MIN_CHARS: usize = 2;
const USERNAME_MAX_CHARS: usize = 100;

/// A ranking whose item names were already matched to ids upstream
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub username: String,
    pub collection: String,
    pub group: String,
    #[serde(default)]
    pub rankings: BTreeMap<ItemId, f64>,
    #[serde(default)]
    pub conflict_report: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub id: i64,
    pub username: String,
    pub status: SubmissionStatus,
    pub ranked_items: usize,
}

impl From<&Submission> for SubmissionReceipt {
    fn from(submission: &Submission) -> Self {
        Self {
            id: submission.id,
            username: submission.username.clone(),
            status: submission.status,
            ranked_items: submission.rankings.as_ref().map_or(0, |r| r.len()),
        }
    }
}

pub struct SubmissionService {
    pool: DbPool,
}

impl SubmissionService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Validate, tie-resolve and store a submission.
    ///
    /// A non-empty conflict report stores a `CONFLICTED` submission with no
    /// rankings; it never reaches the analytics.
    pub fn submit(&self, request: NewSubmission) -> Result<Submission, SubmissionError> {
        let username = validate_username(&request.username)?;
        let conn = database::get_connection(&self.pool)?;
        let group = resolve_group(&conn, &request.collection, &request.group)?;
        let created_at = Utc::now().naive_utc();

        if let Some(report) = request.conflict_report.as_ref().filter(|r| has_conflicts(r)) {
            let stored = database::submissions::insert_submission(
                &conn,
                &username,
                group.collection_id,
                group.id,
                None,
                SubmissionStatus::Conflicted,
                Some(report),
                created_at,
            )?;
            info!("Stored conflicted submission {} from {}", stored.id, username);
            return Ok(stored);
        }

        let positions = validate_positions(&request.rankings, &group)?;
        let rankings = resolve_ties(&positions);

        let stored = database::submissions::insert_submission(
            &conn,
            &username,
            group.collection_id,
            group.id,
            Some(&rankings),
            SubmissionStatus::Valid,
            None,
            created_at,
        )?;
        info!(
            "Stored submission {} from {} ({} items in {})",
            stored.id,
            username,
            rankings.len(),
            group.name
        );
        Ok(stored)
    }

    /// Remove every submission of a user for one group
    pub fn delete(&self, collection: &str, group: &str, username: &str) -> Result<usize, SubmissionError> {
        let conn = database::get_connection(&self.pool)?;
        let group = resolve_group(&conn, collection, group)?;
        let deleted = database::submissions::delete_by_user_and_group(&conn, username.trim(), group.id)?;
        info!("Deleted {} submissions of {} in {}", deleted, username, group.name);
        Ok(deleted)
    }
}

fn resolve_group(conn: &rusqlite::Connection, collection: &str, group: &str) -> Result<Group, SubmissionError> {
    let collection_row = database::collections::find_by_name(conn, collection)?
        .ok_or_else(|| SubmissionError::UnknownCollection(collection.to_string()))?;

    database::groups::find_by_name(conn, collection_row.id, group)?.ok_or_else(|| {
        SubmissionError::UnknownGroup {
            collection: collection.to_string(),
            group: group.to_string(),
        }
    })
}

fn validate_username(raw: &str) -> Result<String, SubmissionError> {
    let username = raw.trim();
    let chars = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&chars) {
        return Err(SubmissionError::Invalid(format!(
            "username must be {}-{} characters",
            USERNAME_MIN_CHARS, USERNAME_MAX_CHARS
        )));
    }
    Ok(username.to_string())
}

fn validate_positions(positions: &BTreeMap<ItemId, f64>, group: &Group) -> Result<RankMap, SubmissionError> {
    if positions.is_empty() {
        return Err(SubmissionError::Invalid("rankings must not be empty".to_string()));
    }

    let items = group.item_set();
    if let Some(unknown) = positions.keys().find(|id| !items.contains(*id)) {
        return Err(SubmissionError::Invalid(format!(
            "item {} is not part of group '{}'",
            unknown, group.name
        )));
    }
    if let Some((id, _)) = positions.iter().find(|(_, p)| !p.is_finite() || **p < 1.0) {
        return Err(SubmissionError::Invalid(format!("item {} has an invalid position", id)));
    }

    Ok(positions.clone())
}

fn has_conflicts(report: &serde_json::Value) -> bool {
    match report {
        serde_json::Value::Null => false,
        serde_json::Value::Object(map) => !map.is_empty(),
        serde_json::Value::Array(list) => !list.is_empty(),
        _ => true,
    }
}
