use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use super::models::Collection;

pub fn upsert_collection(conn: &Connection, name: &str) -> Result<Collection> {
    if let Some(existing) = find_by_name(conn, name)? {
        return Ok(existing);
    }

    let sql = "INSERT INTO collections (name) VALUES (?1) RETURNING id, name, created_at";
    conn.query_row(sql, params![name], parse_collection_row)
        .context("Failed to insert collection")
}

fn parse_collection_row(row: &rusqlite::Row) -> rusqlite::Result<Collection> {
    Ok(Collection {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Collection>> {
    let sql = "SELECT id, name, created_at FROM collections WHERE name = ?1";

    conn.query_row(sql, params![name], parse_collection_row)
        .optional()
        .context("Failed to query collection by name")
}

pub fn list_all(conn: &Connection) -> Result<Vec<Collection>> {
    let sql = "SELECT id, name, created_at FROM collections ORDER BY id";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], parse_collection_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}
