use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::ranking::{ItemId, RankMap};

#[derive(Debug, Clone)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub collection_id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: i64,
    pub collection_id: i64,
    pub name: String,
    pub item_ids: Vec<ItemId>,
    pub is_subunit: bool,
}

impl Group {
    pub fn item_set(&self) -> BTreeSet<ItemId> {
        self.item_ids.iter().copied().collect()
    }

    pub fn size(&self) -> usize {
        self.item_set().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Valid,
    Conflicted,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Valid => "VALID",
            SubmissionStatus::Conflicted => "CONFLICTED",
            SubmissionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SubmissionStatus::Pending),
            "VALID" => Ok(SubmissionStatus::Valid),
            "CONFLICTED" => Ok(SubmissionStatus::Conflicted),
            "FAILED" => Ok(SubmissionStatus::Failed),
            other => anyhow::bail!("Unknown submission status: {}", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub id: i64,
    pub username: String,
    pub collection_id: i64,
    pub group_id: i64,
    pub rankings: Option<RankMap>,
    pub status: SubmissionStatus,
    pub conflict_report: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
}

/// Where a stored analysis applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisScope {
    Collection(i64),
    Group { collection_id: i64, group_id: i64 },
}

impl AnalysisScope {
    pub fn collection_id(&self) -> i64 {
        match *self {
            AnalysisScope::Collection(id) => id,
            AnalysisScope::Group { collection_id, .. } => collection_id,
        }
    }

    /// Collection-wide results are stored under group id 0
    pub fn group_column(&self) -> i64 {
        match *self {
            AnalysisScope::Collection(_) => 0,
            AnalysisScope::Group { group_id, .. } => group_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    pub id: i64,
    pub collection_id: i64,
    pub group_id: i64,
    pub kind: String,
    pub result_data: serde_json::Value,
    pub computed_at: NaiveDateTime,
    pub based_on_submissions: i64,
}
