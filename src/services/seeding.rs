use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::cache::ResultCache;
use crate::database::{self, DbPool};
use crate::errors::parse_context;
use crate::ranking::ItemId;

#[derive(Debug, Deserialize)]
pub struct Catalog {
    pub collections: Vec<CatalogCollection>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogCollection {
    pub name: String,
    pub items: Vec<String>,
    #[serde(default)]
    pub groups: Vec<CatalogGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogGroup {
    pub name: String,
    pub items: Vec<String>,
    #[serde(default)]
    pub is_subunit: bool,
}

#[derive(Debug, Default, PartialEq)]
pub struct SeedSummary {
    pub collections: usize,
    pub items: usize,
    pub groups: usize,
    pub resynced_groups: usize,
}

pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| parse_context("catalog"))
}

/// Upserts collections, items and groups from a catalog.
///
/// A group whose item set changed loses its stored analyses and the cache
/// is cleared, since every cached result may depend on it.
pub fn seed_catalog(pool: &DbPool, cache: &Arc<ResultCache>, catalog: &Catalog) -> Result<SeedSummary> {
    let mut conn = database::get_connection(pool)?;
    let tx = conn.transaction()?;
    let mut summary = SeedSummary::default();

    for entry in &catalog.collections {
        let collection = database::collections::upsert_collection(&tx, entry.name.trim())?;
        summary.collections += 1;

        let mut ids_by_name: HashMap<String, ItemId> = HashMap::new();
        for name in entry.items.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let item = database::items::upsert_item(&tx, collection.id, name)?;
            ids_by_name.insert(item.name, item.id);
            summary.items += 1;
        }

        for group_entry in &entry.groups {
            let (item_ids, unmatched): (Vec<_>, Vec<_>) = group_entry
                .items
                .iter()
                .map(|name| (name, ids_by_name.get(name.trim()).copied()))
                .partition(|(_, id)| id.is_some());

            if !unmatched.is_empty() {
                warn!(
                    "Group '{}': {} items not found in {}",
                    group_entry.name,
                    unmatched.len(),
                    collection.name
                );
            }
            let item_ids: Vec<ItemId> = item_ids.into_iter().filter_map(|(_, id)| id).collect();
            if item_ids.is_empty() {
                warn!("Group '{}': no items matched, skipping", group_entry.name);
                continue;
            }

            let (group, changed) = database::groups::upsert_group(
                &tx,
                collection.id,
                group_entry.name.trim(),
                &item_ids,
                group_entry.is_subunit,
            )?;
            summary.groups += 1;

            if changed {
                let dropped = database::analysis_results::delete_for_group(&tx, group.id)?;
                summary.resynced_groups += 1;
                info!("Group '{}' changed, dropped {} stored analyses", group.name, dropped);
            }
        }
    }

    tx.commit()?;
    if summary.resynced_groups > 0 {
        cache.clear();
    }

    info!(
        "Seeded {} collections, {} items, {} groups",
        summary.collections, summary.items, summary.groups
    );
    Ok(summary)
}
