use anyhow::{Context, Result, bail};
use chrono::{NaiveDateTime, Utc};
use log::{debug, info};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::analytics::{self, AnalysisKind, GroupContext};
use crate::cache::{ResultCache, cache_key};
use crate::config::settings::{AnalyticsSettings, AppConfig};
use crate::database::{self, AnalysisScope, Collection, DbPool, Group, Submission};
use crate::errors::analysis_context;
use crate::ranking::{DivergenceMatrix, DivergenceReport, ItemId, RankedSubmission};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub computed_at: NaiveDateTime,
    pub based_on_submissions: i64,
}

/// Every analysis response: when it was computed, from how many
/// submissions, and the results themselves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEnvelope {
    pub metadata: AnalysisMetadata,
    pub results: Value,
}

impl AnalysisEnvelope {
    fn new(results: Value, computed_at: NaiveDateTime, based_on_submissions: i64) -> Self {
        Self {
            metadata: AnalysisMetadata {
                computed_at,
                based_on_submissions,
            },
            results,
        }
    }

    /// Answer for a collection or group that does not exist
    pub fn empty(kind: AnalysisKind) -> Self {
        Self::new(empty_results(kind), Utc::now().naive_utc(), 0)
    }
}

/// Everything the analytics need from one collection, loaded once
pub struct CollectionData {
    pub collection: Collection,
    pub groups: Vec<Group>,
    pub names: HashMap<ItemId, String>,
    pub latest: Vec<Submission>,
    pub valid_submissions: i64,
}

impl CollectionData {
    pub fn load(conn: &Connection, collection: Collection) -> Result<Self> {
        let groups = database::groups::list_by_collection(conn, collection.id)?;
        let names = database::items::name_map(conn, collection.id)?;
        let latest = database::submissions::latest_valid_per_group(conn, collection.id)?;
        let valid_submissions = database::submissions::count_valid_by_collection(conn, collection.id)?;

        Ok(Self {
            collection,
            groups,
            names,
            latest,
            valid_submissions,
        })
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// The ranking each user contributes to `group`
    pub fn snapshot(&self, group: &Group) -> Vec<RankedSubmission> {
        database::submissions::snapshot_for_group(&self.latest, group)
    }

    /// Run one group-scoped analysis and serialize the result
    pub fn compute_group(&self, kind: AnalysisKind, group: &Group, settings: &AnalyticsSettings) -> Result<Value> {
        let ctx = GroupContext::new(group, &self.names);
        let snapshot = &self.snapshot(group);

        let value = match kind {
            AnalysisKind::CommunityRank => serde_json::to_value(analytics::community_rankings(snapshot, &ctx)),
            AnalysisKind::Divergence => {
                serde_json::to_value(DivergenceMatrix::compute(snapshot, &ctx.items).to_report())
            }
            AnalysisKind::Controversy => {
                serde_json::to_value(analytics::controversy_report(snapshot, &ctx, &settings.controversy))
            }
            AnalysisKind::Takes => serde_json::to_value(analytics::hot_takes(snapshot, &ctx)),
            AnalysisKind::Disputed => serde_json::to_value(analytics::most_disputed(snapshot, &ctx)),
            AnalysisKind::Consensus => serde_json::to_value(analytics::top_bottom_consensus(
                snapshot,
                &ctx,
                settings.consensus_limit,
            )),
            AnalysisKind::Outliers => serde_json::to_value(analytics::outlier_users(snapshot, &ctx)),
            AnalysisKind::Comebacks => serde_json::to_value(analytics::comeback_items(
                snapshot,
                &ctx,
                settings.comeback_min_gap_ratio,
            )),
            AnalysisKind::Subunits => {
                serde_json::to_value(analytics::subunit_popularity(snapshot, &ctx, &self.groups))
            }
            AnalysisKind::Conformity => serde_json::to_value(analytics::conformity(
                snapshot,
                &ctx,
                settings.conformity_min_shared_items,
                settings.conformity_limit,
            )),
            AnalysisKind::Spice => bail!("{} is collection-scoped", kind.as_str()),
        };

        value.with_context(|| analysis_context(kind.as_str(), &group.name))
    }

    pub fn compute_spice(&self) -> Result<Value> {
        serde_json::to_value(analytics::spice_meter(&self.groups, |group| self.snapshot(group)))
            .with_context(|| analysis_context(AnalysisKind::Spice.as_str(), &self.collection.name))
    }
}

fn empty_results(kind: AnalysisKind) -> Value {
    match kind {
        AnalysisKind::Divergence => serde_json::json!({"matrix": {}, "sharedItems": {}}),
        AnalysisKind::Consensus => serde_json::json!({"top": [], "bottom": []}),
        AnalysisKind::Conformity => serde_json::json!({"normies": [], "hipsters": []}),
        _ => Value::Array(Vec::new()),
    }
}

/// Request-path reads: a stored result wins, then the cache, then a live
/// computation that is cached for the next caller.
pub struct AnalysisService {
    pool: DbPool,
    cache: Arc<ResultCache>,
    config: AppConfig,
}

impl AnalysisService {
    pub fn new(pool: DbPool, cache: Arc<ResultCache>, config: AppConfig) -> Self {
        Self { pool, cache, config }
    }

    pub fn group_analysis(&self, collection: &str, group: &str, kind: AnalysisKind) -> Result<AnalysisEnvelope> {
        let conn = database::get_connection(&self.pool)?;
        let Some((data, group)) = self.load_group(&conn, collection, group)? else {
            return Ok(AnalysisEnvelope::empty(kind));
        };
        let scope = AnalysisScope::Group {
            collection_id: data.collection.id,
            group_id: group.id,
        };

        let compute = || data.compute_group(kind, &group, &self.config.analytics);
        self.read_through(&conn, scope, kind, compute, data.valid_submissions)
    }

    /// Top/bottom consensus; a non-default limit is always computed live.
    pub fn consensus(&self, collection: &str, group: &str, limit: Option<usize>) -> Result<AnalysisEnvelope> {
        let default_limit = self.config.analytics.consensus_limit;
        let limit = match limit {
            Some(limit) if limit != default_limit => limit,
            _ => return self.group_analysis(collection, group, AnalysisKind::Consensus),
        };

        let conn = database::get_connection(&self.pool)?;
        let Some((data, group)) = self.load_group(&conn, collection, group)? else {
            return Ok(AnalysisEnvelope::empty(AnalysisKind::Consensus));
        };

        let key = cache_key("CONSENSUS", &[&data.collection.id, &group.id, &limit]);
        self.cached(&key, AnalysisKind::Consensus, data.valid_submissions, || {
            let ctx = GroupContext::new(&group, &data.names);
            let snapshot = data.snapshot(&group);
            Ok(serde_json::to_value(analytics::top_bottom_consensus(&snapshot, &ctx, limit))?)
        })
    }

    pub fn spice(&self, collection: &str) -> Result<AnalysisEnvelope> {
        let conn = database::get_connection(&self.pool)?;
        let Some(collection) = database::collections::find_by_name(&conn, collection)? else {
            return Ok(AnalysisEnvelope::empty(AnalysisKind::Spice));
        };
        let data = CollectionData::load(&conn, collection)?;
        let scope = AnalysisScope::Collection(data.collection.id);

        self.read_through(&conn, scope, AnalysisKind::Spice, || data.compute_spice(), data.valid_submissions)
    }

    /// `None` when either user has no shared item in the group
    pub fn head_to_head(
        &self,
        collection: &str,
        group: &str,
        user_a: &str,
        user_b: &str,
    ) -> Result<Option<AnalysisEnvelope>> {
        let conn = database::get_connection(&self.pool)?;
        let Some((data, group)) = self.load_group(&conn, collection, group)? else {
            return Ok(None);
        };

        let ctx = GroupContext::new(&group, &data.names);
        let Some(result) = analytics::head_to_head(&data.snapshot(&group), &ctx, user_a, user_b) else {
            return Ok(None);
        };

        Ok(Some(AnalysisEnvelope::new(
            serde_json::to_value(result)?,
            Utc::now().naive_utc(),
            data.valid_submissions,
        )))
    }

    /// Soulmates and nemeses, read from the group's divergence matrix
    pub fn user_match(&self, collection: &str, group: &str, user: &str) -> Result<Option<AnalysisEnvelope>> {
        let divergence = self.group_analysis(collection, group, AnalysisKind::Divergence)?;
        let report: DivergenceReport = serde_json::from_value(divergence.results)
            .context("Failed to read divergence matrix")?;

        let Some(matches) = analytics::user_match(&report, user, self.config.analytics.user_match_limit) else {
            return Ok(None);
        };

        Ok(Some(AnalysisEnvelope {
            metadata: divergence.metadata,
            results: serde_json::to_value(matches)?,
        }))
    }

    /// `None` when the user has no valid submission in the collection
    pub fn oshi_bias(&self, collection: &str, user: &str) -> Result<Option<AnalysisEnvelope>> {
        let conn = database::get_connection(&self.pool)?;
        let Some(collection) = database::collections::find_by_name(&conn, collection)? else {
            return Ok(None);
        };
        let data = CollectionData::load(&conn, collection)?;

        let broadest = database::submissions::broadest_per_user(&data.latest);
        let Some(latest) = broadest.iter().find(|s| s.username == user) else {
            return Ok(None);
        };
        let artists = analytics::oshi::artist_subsets(&data.collection.name, &data.groups);
        let Some(report) = analytics::oshi_bias(user, &latest.rankings, &artists) else {
            return Ok(None);
        };

        Ok(Some(AnalysisEnvelope::new(
            serde_json::to_value(report)?,
            Utc::now().naive_utc(),
            data.valid_submissions,
        )))
    }

    fn load_group(&self, conn: &Connection, collection: &str, group: &str) -> Result<Option<(CollectionData, Group)>> {
        let Some(collection) = database::collections::find_by_name(conn, collection)? else {
            debug!("Unknown collection: {}", collection);
            return Ok(None);
        };
        let data = CollectionData::load(conn, collection)?;
        let Some(group) = data.group(group).cloned() else {
            debug!("Unknown group {} in {}", group, data.collection.name);
            return Ok(None);
        };
        Ok(Some((data, group)))
    }

    fn read_through<F>(
        &self,
        conn: &Connection,
        scope: AnalysisScope,
        kind: AnalysisKind,
        compute: F,
        based_on_submissions: i64,
    ) -> Result<AnalysisEnvelope>
    where
        F: FnOnce() -> Result<Value>,
    {
        if let Some(stored) = database::analysis_results::find_result(conn, scope, kind.as_str())? {
            return Ok(AnalysisEnvelope::new(
                stored.result_data,
                stored.computed_at,
                stored.based_on_submissions,
            ));
        }

        let key = cache_key(kind.as_str(), &[&scope.collection_id(), &scope.group_column()]);
        self.cached(&key, kind, based_on_submissions, compute)
    }

    fn cached<F>(&self, key: &str, kind: AnalysisKind, based_on_submissions: i64, compute: F) -> Result<AnalysisEnvelope>
    where
        F: FnOnce() -> Result<Value>,
    {
        if let Some(hit) = self.cache.get::<AnalysisEnvelope>(key) {
            debug!("Cache hit: {}", key);
            return Ok(hit);
        }

        info!("Computing {} live", key);
        let envelope = AnalysisEnvelope::new(compute()?, Utc::now().naive_utc(), based_on_submissions);

        let ttl = if kind.is_heavy() {
            self.config.cache.heavy_ttl
        } else {
            self.config.cache.default_ttl
        };
        self.cache.set_with_ttl(key, &envelope, ttl)?;
        Ok(envelope)
    }
}
