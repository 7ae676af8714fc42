use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::cache::ResultCache;
use crate::config::settings::AppConfig;
use crate::database::DbPool;
use crate::services::analysis::AnalysisService;
use crate::services::recompute::RecomputeOrchestrator;
use crate::services::submissions::SubmissionService;

pub mod admin;
pub mod analysis;
pub mod catalog;
pub mod health;
pub mod submissions;

pub struct AppState {
    pub pool: DbPool,
    pub analysis: AnalysisService,
    pub submissions: SubmissionService,
    pub orchestrator: Arc<RecomputeOrchestrator>,
}

impl AppState {
    /// Wire every service around one pool and one shared cache
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let cache = Arc::new(ResultCache::new(config.cache.default_ttl));
        let orchestrator = Arc::new(RecomputeOrchestrator::new(
            pool.clone(),
            Arc::clone(&cache),
            config.clone(),
        ));

        Self {
            analysis: AnalysisService::new(pool.clone(), cache, config),
            submissions: SubmissionService::new(pool.clone()),
            orchestrator,
            pool,
        }
    }
}

pub(crate) fn internal_error(e: anyhow::Error) -> Response {
    log::error!("Request failed: {:?}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Query Error: {}", e)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalysisKind;
    use crate::database::{self, testing::*};
    use crate::ranking::types::rank_map;
    use crate::services::submissions::NewSubmission;
    use std::collections::BTreeMap;

    #[test]
    fn test_services_share_one_cache() {
        let (_dir, pool) = test_pool();
        let conn = database::get_connection(&pool).unwrap();
        let (_, group, ids) = seed_collection(&conn, "liella", &["A", "B"]);
        submit(&conn, "alice", &group, rank_map([(ids[0], 1.0), (ids[1], 2.0)]), 5);

        let mut config = AppConfig::new();
        config.analytics.min_valid_submissions = 10;
        let state = AppState::new(pool.clone(), config);
        let read = || {
            state
                .analysis
                .group_analysis("liella", "All Songs", AnalysisKind::CommunityRank)
                .unwrap()
        };

        assert_eq!(read().metadata.based_on_submissions, 1);
        state
            .submissions
            .submit(NewSubmission {
                username: "bob".to_string(),
                collection: "liella".to_string(),
                group: "All Songs".to_string(),
                rankings: BTreeMap::from([(ids[0], 2.0), (ids[1], 1.0)]),
                conflict_report: None,
            })
            .unwrap();
        assert_eq!(read().metadata.based_on_submissions, 1);

        let summary = state.orchestrator.run_once().unwrap();
        assert_eq!(summary.collections_skipped, 1);
        assert_eq!(read().metadata.based_on_submissions, 2);
    }
}
