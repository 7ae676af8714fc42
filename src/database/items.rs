use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;

use super::models::Item;
use crate::ranking::ItemId;

pub fn upsert_item(conn: &Connection, collection_id: i64, name: &str) -> Result<Item> {
    if let Some(existing) = find_by_name(conn, collection_id, name)? {
        return Ok(existing);
    }

    let sql = "INSERT INTO items (collection_id, name) VALUES (?1, ?2) RETURNING id, collection_id, name";
    conn.query_row(sql, params![collection_id, name], parse_item_row)
        .context("Failed to insert item")
}

fn parse_item_row(row: &rusqlite::Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        collection_id: row.get(1)?,
        name: row.get(2)?,
    })
}

pub fn find_by_name(conn: &Connection, collection_id: i64, name: &str) -> Result<Option<Item>> {
    let sql = "SELECT id, collection_id, name FROM items WHERE collection_id = ?1 AND name = ?2";

    conn.query_row(sql, params![collection_id, name], parse_item_row)
        .optional()
        .context("Failed to query item by name")
}

pub fn list_by_collection(conn: &Connection, collection_id: i64) -> Result<Vec<Item>> {
    let sql = "SELECT id, collection_id, name FROM items WHERE collection_id = ?1 ORDER BY id";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![collection_id], parse_item_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Item id -> name for one collection
pub fn name_map(conn: &Connection, collection_id: i64) -> Result<HashMap<ItemId, String>> {
    Ok(list_by_collection(conn, collection_id)?
        .into_iter()
        .map(|item| (item.id, item.name))
        .collect())
}
