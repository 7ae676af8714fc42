use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};

use super::models::{AnalysisScope, StoredAnalysis};
use crate::errors::storage_context;

const RESULT_COLUMNS: &str =
    "id, collection_id, group_id, kind, result_data, computed_at, based_on_submissions";

/// Insert or overwrite the single result stored for (scope, kind)
pub fn upsert_result(
    conn: &Connection,
    scope: AnalysisScope,
    kind: &str,
    result_data: &serde_json::Value,
    computed_at: NaiveDateTime,
    based_on_submissions: i64,
) -> Result<StoredAnalysis> {
    let data = serde_json::to_string(result_data)
        .with_context(|| storage_context("serialize", kind))?;

    let sql = format!(
        "INSERT INTO analysis_results (collection_id, group_id, kind, result_data, computed_at, based_on_submissions) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
         ON CONFLICT (collection_id, group_id, kind) DO UPDATE SET \
         result_data = excluded.result_data, computed_at = excluded.computed_at, based_on_submissions = excluded.based_on_submissions \
         RETURNING {}",
        RESULT_COLUMNS
    );

    conn.query_row(
        &sql,
        params![
            scope.collection_id(),
            scope.group_column(),
            kind,
            data,
            computed_at,
            based_on_submissions
        ],
        parse_result_row,
    )
    .with_context(|| storage_context("upsert", kind))
}

fn parse_result_row(row: &rusqlite::Row) -> rusqlite::Result<StoredAnalysis> {
    let data: String = row.get(4)?;
    let result_data = serde_json::from_str(&data).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(StoredAnalysis {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        group_id: row.get(2)?,
        kind: row.get(3)?,
        result_data,
        computed_at: row.get(5)?,
        based_on_submissions: row.get(6)?,
    })
}

pub fn find_result(conn: &Connection, scope: AnalysisScope, kind: &str) -> Result<Option<StoredAnalysis>> {
    let sql = format!(
        "SELECT {} FROM analysis_results WHERE collection_id = ?1 AND group_id = ?2 AND kind = ?3",
        RESULT_COLUMNS
    );

    conn.query_row(
        &sql,
        params![scope.collection_id(), scope.group_column(), kind],
        parse_result_row,
    )
    .optional()
    .with_context(|| storage_context("load", kind))
}

/// Drop every stored result of one group
pub fn delete_for_group(conn: &Connection, group_id: i64) -> Result<usize> {
    conn.execute("DELETE FROM analysis_results WHERE group_id = ?1", params![group_id])
        .context("Failed to delete stored analyses for group")
}

pub fn count_for_collection(conn: &Connection, collection_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM analysis_results WHERE collection_id = ?1",
        params![collection_id],
        |r| r.get(0),
    )
    .context("Failed to count stored analyses")
}
