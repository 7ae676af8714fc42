use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ranking::ItemId;

#[derive(Deserialize)]
pub struct CollectionParams {
    pub collection: String,
}

#[derive(Deserialize)]
pub struct GroupParams {
    pub collection: String,
    pub group: String,
}

#[derive(Deserialize)]
pub struct ConsensusParams {
    pub collection: String,
    pub group: String,
    pub limit: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadToHeadParams {
    pub collection: String,
    pub group: String,
    pub user_a: String,
    pub user_b: String,
}

#[derive(Deserialize)]
pub struct UserParams {
    pub collection: String,
    pub group: String,
    pub user: String,
}

#[derive(Deserialize)]
pub struct OshiParams {
    pub collection: String,
    pub user: String,
}

#[derive(Deserialize)]
pub struct DeleteParams {
    pub collection: String,
    pub group: String,
    pub username: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
    pub collection: String,
    pub item_count: usize,
    pub is_subunit: bool,
    pub items: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedItem {
    pub item_id: ItemId,
    pub item_name: String,
    pub rank: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRanking {
    pub username: String,
    pub rankings: Vec<RankedItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub deleted: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub status: String,
    pub message: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub recompute_running: bool,
}
