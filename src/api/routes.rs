use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::api::handlers::{
    AppState,
    admin::trigger_recompute,
    analysis::{
        get_comebacks, get_conformity, get_consensus, get_controversy, get_divergence, get_head_to_head,
        get_hot_takes, get_most_disputed, get_oshi_bias, get_outliers, get_rankings, get_spice, get_subunits,
        get_user_match,
    },
    catalog::{get_groups, get_user_rankings},
    health::health,
    submissions::{create_submission, delete_submissions},
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/groups", get(get_groups))
        .route("/api/users/rankings", get(get_user_rankings))
        .route("/api/submissions", post(create_submission).delete(delete_submissions))
        .route("/api/analysis/rankings", get(get_rankings))
        .route("/api/analysis/divergence", get(get_divergence))
        .route("/api/analysis/controversy", get(get_controversy))
        .route("/api/analysis/takes", get(get_hot_takes))
        .route("/api/analysis/spice", get(get_spice))
        .route("/api/analysis/disputed", get(get_most_disputed))
        .route("/api/analysis/consensus", get(get_consensus))
        .route("/api/analysis/outliers", get(get_outliers))
        .route("/api/analysis/comebacks", get(get_comebacks))
        .route("/api/analysis/subunits", get(get_subunits))
        .route("/api/analysis/head-to-head", get(get_head_to_head))
        .route("/api/analysis/user-match", get(get_user_match))
        .route("/api/analysis/conformity", get(get_conformity))
        .route("/api/analysis/oshi-bias", get(get_oshi_bias))
        .route("/api/admin/recompute", post(trigger_recompute))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::AppConfig;
    use crate::database::{self, testing::*};
    use crate::ranking::types::rank_map;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_rankings_endpoint_returns_envelope() {
        let (_dir, pool) = test_pool();
        let conn = database::get_connection(&pool).unwrap();
        let (_, group, ids) = seed_collection(&conn, "liella", &["A", "B", "C"]);
        submit(&conn, "alice", &group, rank_map([(ids[0], 1.0), (ids[1], 2.0), (ids[2], 3.0)]), 2);
        submit(&conn, "bob", &group, rank_map([(ids[0], 3.0), (ids[1], 2.0), (ids[2], 1.0)]), 1);
        let router = create_router(Arc::new(AppState::new(pool.clone(), AppConfig::new())));

        let (status, body) = call(router, get_request("/api/analysis/rankings?collection=liella&group=All%20Songs")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["basedOnSubmissions"], 2);
        assert_eq!(body["results"].as_array().unwrap().len(), 3);
        assert_eq!(body["results"][0]["average"], 2.0);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty_and_unknown_user_is_404() {
        let (_dir, pool) = test_pool();
        let router = create_router(Arc::new(AppState::new(pool.clone(), AppConfig::new())));

        let (status, body) = call(router.clone(), get_request("/api/analysis/takes?collection=x&group=y")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["basedOnSubmissions"], 0);
        assert_eq!(body["results"], serde_json::json!([]));

        let (status, _) = call(router, get_request("/api/analysis/oshi-bias?collection=x&user=alice")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_submission_validation_maps_to_422() {
        let (_dir, pool) = test_pool();
        let conn = database::get_connection(&pool).unwrap();
        let (_, _, ids) = seed_collection(&conn, "liella", &["A", "B"]);
        let router = create_router(Arc::new(AppState::new(pool.clone(), AppConfig::new())));

        let rankings = std::collections::BTreeMap::from([(ids[0], 1), (ids[1], 2)]);
        let body = serde_json::json!({
            "username": "x",
            "collection": "liella",
            "group": "All Songs",
            "rankings": rankings
        });
        let request = Request::builder()
            .method("POST")
            .uri("/api/submissions")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, _) = call(router.clone(), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let mut valid = body.clone();
        valid["username"] = Value::from("alice");
        let request = Request::builder()
            .method("POST")
            .uri("/api/submissions")
            .header("content-type", "application/json")
            .body(Body::from(valid.to_string()))
            .unwrap();
        let (status, receipt) = call(router, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(receipt["status"], "VALID");
        assert_eq!(receipt["rankedItems"], 2);
    }

    #[tokio::test]
    async fn test_recompute_conflicts_while_running() {
        let (_dir, pool) = test_pool();
        let state = Arc::new(AppState::new(pool.clone(), AppConfig::new()));
        let router = create_router(Arc::clone(&state));
        let guard = state.orchestrator.begin().unwrap();

        let post = || Request::builder().method("POST").uri("/api/admin/recompute").body(Body::empty()).unwrap();
        let (status, _) = call(router.clone(), post()).await;
        assert_eq!(status, StatusCode::CONFLICT);

        drop(guard);
        let (status, body) = call(router, post()).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["status"], "accepted");
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, pool) = test_pool();
        let router = create_router(Arc::new(AppState::new(pool, AppConfig::new())));

        let (status, body) = call(router, get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], "ok");
    }
}
