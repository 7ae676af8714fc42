pub mod analysis_results;
pub mod collections;
pub mod connection;
pub mod groups;
pub mod items;
pub mod models;
pub mod setup;
pub mod submissions;

pub use connection::{DbConn, DbPool, create_pool, get_connection};
pub use models::*;


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::ranking::types::rank_map;
    use chrono::Utc;

    #[test]
    fn test_snapshot_keeps_latest_per_user() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();
        let (collection, group, ids) = seed_collection(&conn, "liella", &["A", "B"]);

        submit(&conn, "alice", &group, rank_map([(ids[0], 1.0), (ids[1], 2.0)]), 10);
        submit(&conn, "alice", &group, rank_map([(ids[0], 2.0), (ids[1], 1.0)]), 1);
        submit(&conn, "bob", &group, rank_map([(ids[0], 1.0)]), 5);

        let latest = submissions::latest_valid_per_group(&conn, collection.id).unwrap();
        let snapshot = submissions::snapshot_for_group(&latest, &group);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].username, "alice");
        assert_eq!(snapshot[0].rankings[&ids[0]], 2.0);
        assert_eq!(submissions::count_valid_by_collection(&conn, collection.id).unwrap(), 3);
    }

    #[test]
    fn test_conflicted_submissions_are_not_valid() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();
        let (collection, group, _) = seed_collection(&conn, "liella", &["A"]);

        let report = serde_json::json!({"line 2": {"reason": "unknown song"}});
        let stored = submissions::insert_submission(
            &conn,
            "carol",
            collection.id,
            group.id,
            None,
            SubmissionStatus::Conflicted,
            Some(&report),
            Utc::now().naive_utc(),
        )
        .unwrap();

        assert_eq!(stored.status, SubmissionStatus::Conflicted);
        assert!(stored.rankings.is_none());
        assert!(submissions::latest_valid_per_group(&conn, collection.id).unwrap().is_empty());
    }

    #[test]
    fn test_smaller_group_keeps_full_ranking() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();
        let (collection, all_songs, ids) = seed_collection(&conn, "liella", &["A", "B", "C"]);
        let (solo, _) = groups::upsert_group(&conn, collection.id, "Kanon Solos", &ids[..1], false).unwrap();

        submit(&conn, "alice", &all_songs, rank_map([(ids[0], 1.0), (ids[1], 2.0), (ids[2], 3.0)]), 10);
        submit(&conn, "bob", &all_songs, rank_map([(ids[0], 3.0), (ids[1], 2.0), (ids[2], 1.0)]), 5);
        submit(&conn, "alice", &solo, rank_map([(ids[0], 1.0)]), 1);

        let latest = submissions::latest_valid_per_group(&conn, collection.id).unwrap();
        assert_eq!(latest.len(), 3);

        let full = submissions::snapshot_for_group(&latest, &all_songs);
        assert_eq!(full.len(), 2);
        assert!(full.iter().all(|s| s.rankings.len() == 3));

        let solos = submissions::snapshot_for_group(&latest, &solo);
        assert_eq!(solos[0].username, "alice");
        assert_eq!(solos[0].rankings.len(), 1);
        assert_eq!(solos[1].username, "bob");
        assert_eq!(solos[1].rankings.len(), 3);

        let broadest = submissions::broadest_per_user(&latest);
        assert_eq!(broadest[0].rankings.len(), 3);
    }

    #[test]
    fn test_users_outside_a_group_are_left_out() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();
        let (collection, _, ids) = seed_collection(&conn, "liella", &["A", "B"]);
        let (first, _) = groups::upsert_group(&conn, collection.id, "First", &ids[..1], false).unwrap();
        let (second, _) = groups::upsert_group(&conn, collection.id, "Second", &ids[1..], false).unwrap();

        submit(&conn, "alice", &first, rank_map([(ids[0], 1.0)]), 1);

        let latest = submissions::latest_valid_per_group(&conn, collection.id).unwrap();
        assert!(submissions::snapshot_for_group(&latest, &second).is_empty());
    }

    #[test]
    fn test_analysis_upsert_overwrites() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();
        let (collection, group, _) = seed_collection(&conn, "liella", &["A"]);
        let scope = AnalysisScope::Group {
            collection_id: collection.id,
            group_id: group.id,
        };
        let now = Utc::now().naive_utc();

        analysis_results::upsert_result(&conn, scope, "TAKES", &serde_json::json!([1]), now, 2).unwrap();
        analysis_results::upsert_result(&conn, scope, "TAKES", &serde_json::json!([2]), now, 3).unwrap();
        analysis_results::upsert_result(&conn, AnalysisScope::Collection(collection.id), "SPICE", &serde_json::json!([]), now, 3).unwrap();

        let stored = analysis_results::find_result(&conn, scope, "TAKES").unwrap().unwrap();
        assert_eq!(stored.result_data, serde_json::json!([2]));
        assert_eq!(stored.based_on_submissions, 3);
        assert_eq!(analysis_results::count_for_collection(&conn, collection.id).unwrap(), 2);
    }

    #[test]
    fn test_group_resync_reports_change() {
        let (_dir, pool) = test_pool();
        let conn = get_connection(&pool).unwrap();
        let (collection, group, ids) = seed_collection(&conn, "liella", &["A", "B"]);

        let (_, unchanged) = groups::upsert_group(&conn, collection.id, "All Songs", &[ids[1], ids[0]], false).unwrap();
        let (updated, changed) = groups::upsert_group(&conn, collection.id, "All Songs", &ids[..1], false).unwrap();

        assert!(!unchanged);
        assert!(changed);
        assert_eq!(updated.id, group.id);
        assert_eq!(updated.item_ids, vec![ids[0]]);
    }
}
