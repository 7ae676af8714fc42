use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;

use super::models::Group;
use crate::errors::parse_context;
use crate::ranking::ItemId;

const GROUP_COLUMNS: &str = "id, collection_id, name, item_ids, is_subunit";

/// Insert a group or replace the item set of an existing one.
///
/// Returns the stored group and whether an existing group's item set changed.
pub fn upsert_group(
    conn: &Connection,
    collection_id: i64,
    name: &str,
    item_ids: &[ItemId],
    is_subunit: bool,
) -> Result<(Group, bool)> {
    let item_json = serde_json::to_string(item_ids).context("Failed to serialize group items")?;

    if let Some(existing) = find_by_name(conn, collection_id, name)? {
        let new_items: BTreeSet<ItemId> = item_ids.iter().copied().collect();
        let changed = existing.item_set() != new_items;
        let sql = format!(
            "UPDATE item_groups SET item_ids = ?1, is_subunit = ?2 WHERE id = ?3 RETURNING {}",
            GROUP_COLUMNS
        );
        let group = conn
            .query_row(&sql, params![item_json, is_subunit, existing.id], parse_group_row)
            .context("Failed to update group")?;
        return Ok((group, changed));
    }

    let sql = format!(
        "INSERT INTO item_groups (collection_id, name, item_ids, is_subunit) VALUES (?1, ?2, ?3, ?4) RETURNING {}",
        GROUP_COLUMNS
    );
    let group = conn
        .query_row(&sql, params![collection_id, name, item_json, is_subunit], parse_group_row)
        .context("Failed to insert group")?;
    Ok((group, false))
}

fn parse_group_row(row: &rusqlite::Row) -> rusqlite::Result<Group> {
    let item_json: String = row.get(3)?;
    let item_ids = serde_json::from_str(&item_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Group {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        name: row.get(2)?,
        item_ids,
        is_subunit: row.get(4)?,
    })
}

pub fn find_by_name(conn: &Connection, collection_id: i64, name: &str) -> Result<Option<Group>> {
    let sql = format!(
        "SELECT {} FROM item_groups WHERE collection_id = ?1 AND name = ?2",
        GROUP_COLUMNS
    );

    conn.query_row(&sql, params![collection_id, name], parse_group_row)
        .optional()
        .with_context(|| parse_context("group"))
}

pub fn list_by_collection(conn: &Connection, collection_id: i64) -> Result<Vec<Group>> {
    let sql = format!(
        "SELECT {} FROM item_groups WHERE collection_id = ?1 ORDER BY id",
        GROUP_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![collection_id], parse_group_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| parse_context("groups"))?;

    Ok(rows)
}
