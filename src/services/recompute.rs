use anyhow::Result;
use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::analytics::AnalysisKind;
use crate::cache::ResultCache;
use crate::config::settings::AppConfig;
use crate::database::{self, AnalysisScope, Collection, DbPool};
use crate::errors::RecomputeError;
use crate::services::analysis::CollectionData;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeSummary {
    pub collections_processed: usize,
    pub collections_skipped: usize,
    pub results_written: usize,
    pub failures: usize,
}

/// Proof that a run is in progress; the flag is released on drop
#[must_use]
pub struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Recomputes and stores every analysis of every collection.
///
/// At most one run is in flight: a second trigger is rejected, not queued.
pub struct RecomputeOrchestrator {
    pool: DbPool,
    cache: Arc<ResultCache>,
    config: AppConfig,
    running: Arc<AtomicBool>,
}

impl RecomputeOrchestrator {
    pub fn new(pool: DbPool, cache: Arc<ResultCache>, config: AppConfig) -> Self {
        Self {
            pool,
            cache,
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claim the single run slot
    pub fn begin(&self) -> Result<RunGuard, RecomputeError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RecomputeError::AlreadyRunning)?;

        Ok(RunGuard {
            flag: Arc::clone(&self.running),
        })
    }

    pub fn run_once(&self) -> Result<RecomputeSummary, RecomputeError> {
        let guard = self.begin()?;
        self.run(guard)
    }

    pub fn run(&self, _guard: RunGuard) -> Result<RecomputeSummary, RecomputeError> {
        info!("=== Starting analysis recomputation ===");
        let mut conn = database::get_connection(&self.pool)?;
        let collections = database::collections::list_all(&conn)?;
        let mut summary = RecomputeSummary::default();

        for collection in collections {
            let name = collection.name.clone();
            match self.recompute_collection(&mut conn, collection, &mut summary) {
                Ok(true) => summary.collections_processed += 1,
                Ok(false) => summary.collections_skipped += 1,
                Err(e) => {
                    error!("Recompute failed for collection {}: {:?}", name, e);
                    summary.failures += 1;
                }
            }
        }

        self.cache.clear();
        info!(
            "=== Recomputation complete: {} processed, {} skipped, {} results, {} failures ===",
            summary.collections_processed,
            summary.collections_skipped,
            summary.results_written,
            summary.failures
        );
        Ok(summary)
    }

    /// Returns `false` when the collection has too few submissions
    fn recompute_collection(
        &self,
        conn: &mut rusqlite::Connection,
        collection: Collection,
        summary: &mut RecomputeSummary,
    ) -> Result<bool> {
        let valid = database::submissions::count_valid_by_collection(conn, collection.id)?;
        if valid < self.config.analytics.min_valid_submissions as i64 {
            warn!("Skipping {}: only {} valid submissions", collection.name, valid);
            return Ok(false);
        }

        let data = CollectionData::load(conn, collection)?;
        let computed_at = Utc::now().naive_utc();
        let tx = conn.transaction()?;

        for group in &data.groups {
            let scope = AnalysisScope::Group {
                collection_id: data.collection.id,
                group_id: group.id,
            };
            for kind in AnalysisKind::GROUP_SCOPED {
                let stored = data
                    .compute_group(kind, group, &self.config.analytics)
                    .and_then(|value| {
                        database::analysis_results::upsert_result(
                            &tx,
                            scope,
                            kind.as_str(),
                            &value,
                            computed_at,
                            data.valid_submissions,
                        )
                    });
                match stored {
                    Ok(_) => summary.results_written += 1,
                    Err(e) => {
                        error!("{} failed for {}/{}: {:?}", kind.as_str(), data.collection.name, group.name, e);
                        summary.failures += 1;
                    }
                }
            }
        }

        let spice = data.compute_spice().and_then(|value| {
            database::analysis_results::upsert_result(
                &tx,
                AnalysisScope::Collection(data.collection.id),
                AnalysisKind::Spice.as_str(),
                &value,
                computed_at,
                data.valid_submissions,
            )
        });
        match spice {
            Ok(_) => summary.results_written += 1,
            Err(e) => {
                error!("SPICE failed for {}: {:?}", data.collection.name, e);
                summary.failures += 1;
            }
        }

        tx.commit()?;
        info!("Recomputed {} ({} groups)", data.collection.name, data.groups.len());
        Ok(true)
    }
}
