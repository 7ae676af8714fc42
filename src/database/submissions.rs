use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{Connection, params};
use std::collections::{BTreeMap, HashSet};

use super::models::{Group, Submission, SubmissionStatus};
use crate::errors::parse_context;
use crate::ranking::{RankMap, RankedSubmission};

const SUBMISSION_COLUMNS: &str =
    "id, username, collection_id, group_id, rankings, status, conflict_report, created_at";

#[allow(clippy::too_many_arguments)]
pub fn insert_submission(
    conn: &Connection,
    username: &str,
    collection_id: i64,
    group_id: i64,
    rankings: Option<&RankMap>,
    status: SubmissionStatus,
    conflict_report: Option<&serde_json::Value>,
    created_at: NaiveDateTime,
) -> Result<Submission> {
    let rankings_json = rankings
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to serialize rankings")?;
    let conflicts_json = conflict_report
        .map(serde_json::to_string)
        .transpose()
        .context("Failed to serialize conflict report")?;

    let sql = format!(
        "INSERT INTO submissions (username, collection_id, group_id, rankings, status, conflict_report, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING {}",
        SUBMISSION_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            username,
            collection_id,
            group_id,
            rankings_json,
            status.as_str(),
            conflicts_json,
            created_at
        ],
        parse_submission_row,
    )
    .context("Failed to insert submission")
}

fn parse_submission_row(row: &rusqlite::Row) -> rusqlite::Result<Submission> {
    let rankings: Option<String> = row.get(4)?;
    let status: String = row.get(5)?;
    let conflicts: Option<String> = row.get(6)?;

    Ok(Submission {
        id: row.get(0)?,
        username: row.get(1)?,
        collection_id: row.get(2)?,
        group_id: row.get(3)?,
        rankings: rankings.map(|json| parse_json_column(4, &json)).transpose()?,
        status: status.parse().map_err(|e: anyhow::Error| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
        })?,
        conflict_report: conflicts.map(|json| parse_json_column(6, &json)).transpose()?,
        created_at: row.get(7)?,
    })
}

fn parse_json_column<T: serde::de::DeserializeOwned>(idx: usize, json: &str) -> rusqlite::Result<T> {
    serde_json::from_str(json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Valid submissions of a collection, newest first
pub fn list_valid_by_collection(conn: &Connection, collection_id: i64) -> Result<Vec<Submission>> {
    let sql = format!(
        "SELECT {} FROM submissions WHERE collection_id = ?1 AND status = ?2 AND rankings IS NOT NULL ORDER BY created_at DESC, id DESC",
        SUBMISSION_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![collection_id, SubmissionStatus::Valid.as_str()], parse_submission_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| parse_context("submissions"))?;

    Ok(rows)
}

/// Latest valid submission per (username, group), newest first
pub fn latest_valid_per_group(conn: &Connection, collection_id: i64) -> Result<Vec<Submission>> {
    let mut seen = HashSet::new();
    let latest = list_valid_by_collection(conn, collection_id)?
        .into_iter()
        .filter(|s| seen.insert((s.username.clone(), s.group_id)))
        .collect();

    Ok(latest)
}

/// The ranking each user contributes to `group`, sorted by username.
///
/// A submission made for the group itself wins. Otherwise the submission
/// covering most of the group's items is used, so a full-universe ranking
/// keeps counting after the user submits a smaller group. Users with no
/// ranked item in the group are left out.
pub fn snapshot_for_group(latest: &[Submission], group: &Group) -> Vec<RankedSubmission> {
    let items = group.item_set();
    let coverage = |s: &Submission| {
        let rankings = s.rankings.as_ref();
        let overlap = rankings.map_or(0, |r| r.keys().filter(|id| items.contains(*id)).count());
        (s.group_id == group.id, overlap, rankings.map_or(0, |r| r.len()))
    };

    pick_per_user(latest, |s| {
        let key = coverage(s);
        (key.0 || key.1 > 0).then_some(key)
    })
}

/// Each user's broadest ranking across the collection, sorted by username
pub fn broadest_per_user(latest: &[Submission]) -> Vec<RankedSubmission> {
    pick_per_user(latest, |s| s.rankings.as_ref().map(|r| r.len()))
}

/// Keeps the highest-scoring submission per user; the earlier one wins a
/// tie, which is the newer one given newest-first input.
fn pick_per_user<K, F>(latest: &[Submission], score: F) -> Vec<RankedSubmission>
where
    K: Ord,
    F: Fn(&Submission) -> Option<K>,
{
    let mut best: BTreeMap<&str, (K, &Submission)> = BTreeMap::new();
    for submission in latest {
        let Some(key) = score(submission) else {
            continue;
        };
        let better = best
            .get(submission.username.as_str())
            .is_none_or(|(current, _)| key > *current);
        if better {
            best.insert(submission.username.as_str(), (key, submission));
        }
    }

    best.into_values()
        .filter_map(|(_, s)| s.rankings.clone().map(|r| RankedSubmission::new(s.username.clone(), r)))
        .collect()
}

pub fn count_valid_by_collection(conn: &Connection, collection_id: i64) -> Result<i64> {
    let sql = "SELECT COUNT(*) FROM submissions WHERE collection_id = ?1 AND status = ?2 AND rankings IS NOT NULL";

    conn.query_row(sql, params![collection_id, SubmissionStatus::Valid.as_str()], |r| r.get(0))
        .context("Failed to count valid submissions")
}

pub fn delete_by_user_and_group(conn: &Connection, username: &str, group_id: i64) -> Result<usize> {
    let sql = "DELETE FROM submissions WHERE username = ?1 AND group_id = ?2";

    conn.execute(sql, params![username, group_id])
        .context("Failed to delete submissions")
}
