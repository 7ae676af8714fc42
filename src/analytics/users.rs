use serde::{Deserialize, Serialize};

use super::{GroupContext, item_means};
use crate::ranking::dispersion::{rms, round_to};
use crate::ranking::{DivergenceReport, ItemId, RankMap, RankedSubmission};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierUser {
    pub username: String,
    pub avg_deviation: f64,
    pub items_ranked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDiff {
    pub item_id: ItemId,
    pub item_name: String,
    pub rank_a: f64,
    pub rank_b: f64,
    pub diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadToHead {
    pub user_a: String,
    pub user_b: String,
    pub shared_items: usize,
    pub avg_diff: f64,
    pub rms_diff: f64,
    pub compatibility: f64,
    pub differences: Vec<ItemDiff>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEntry {
    pub username: String,
    pub distance: f64,
    pub shared_items: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMatch {
    pub username: String,
    pub soulmates: Vec<MatchEntry>,
    pub nemeses: Vec<MatchEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConformityEntry {
    pub username: String,
    pub deviation: f64,
    pub shared_items: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConformityReport {
    pub normies: Vec<ConformityEntry>,
    pub hipsters: Vec<ConformityEntry>,
}

/// Users ordered by how far, on average, they sit from the item means.
/// Needs at least two users to have a reference point.
pub fn outlier_users(submissions: &[RankedSubmission], ctx: &GroupContext) -> Vec<OutlierUser> {
    let relative = ctx.relativize_all(submissions);
    if relative.len() < 2 {
        return Vec::new();
    }
    let means = item_means(&relative);

    let mut users: Vec<OutlierUser> = relative
        .iter()
        .map(|(username, ranks)| OutlierUser {
            username: username.clone(),
            avg_deviation: round_to(mean_abs_deviation(ranks, |item_id| means.get(&item_id).copied()), 2),
            items_ranked: ranks.len(),
        })
        .collect();

    users.sort_by(|a, b| {
        b.avg_deviation
            .total_cmp(&a.avg_deviation)
            .then_with(|| a.username.cmp(&b.username))
    });
    users
}

/// Item-by-item comparison of two users over the items both ranked.
///
/// `None` when either user has nothing in the group or they share no item.
pub fn head_to_head(
    submissions: &[RankedSubmission],
    ctx: &GroupContext,
    user_a: &str,
    user_b: &str,
) -> Option<HeadToHead> {
    let relative = ctx.relativize_all(submissions);
    let find = |name: &str| relative.iter().find(|(u, _)| u == name).map(|(_, ranks)| ranks);
    let ranks_a = find(user_a)?;
    let ranks_b = find(user_b)?;

    let mut differences: Vec<ItemDiff> = ranks_a
        .iter()
        .filter_map(|(item_id, &rank_a)| {
            let rank_b = *ranks_b.get(item_id)?;
            Some(ItemDiff {
                item_id: *item_id,
                item_name: ctx.name_of(*item_id),
                rank_a,
                rank_b,
                diff: (rank_a - rank_b).abs(),
            })
        })
        .collect();

    if differences.is_empty() {
        return None;
    }
    differences.sort_by(|a, b| b.diff.total_cmp(&a.diff).then(a.item_id.cmp(&b.item_id)));

    let shared = differences.len();
    let diffs: Vec<f64> = differences.iter().map(|d| d.diff).collect();
    let avg_diff = diffs.iter().sum::<f64>() / shared as f64;
    let compatibility = (100.0 * (1.0 - avg_diff / (shared as f64 / 2.0))).max(0.0);

    Some(HeadToHead {
        user_a: user_a.to_string(),
        user_b: user_b.to_string(),
        shared_items: shared,
        avg_diff: round_to(avg_diff, 2),
        rms_diff: round_to(rms(&diffs), 2),
        compatibility: round_to(compatibility, 1),
        differences,
    })
}

/// Closest and furthest users from one row of a divergence report.
///
/// Pairs without a shared item carry no signal and are left out.
pub fn user_match(report: &DivergenceReport, username: &str, limit: usize) -> Option<UserMatch> {
    let row = report.matrix.get(username)?;
    let shared_row = report.shared_items.get(username);

    let mut others: Vec<MatchEntry> = row
        .iter()
        .filter(|(other, _)| other.as_str() != username)
        .filter_map(|(other, &distance)| {
            let shared_items = shared_row.and_then(|r| r.get(other)).copied().unwrap_or(0);
            (shared_items > 0).then(|| MatchEntry {
                username: other.clone(),
                distance,
                shared_items,
            })
        })
        .collect();

    others.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.username.cmp(&b.username)));

    Some(UserMatch {
        username: username.to_string(),
        soulmates: others.iter().take(limit).cloned().collect(),
        nemeses: others.iter().rev().take(limit).cloned().collect(),
    })
}

/// Normies sit closest to the consensus mean, hipsters furthest from it.
pub fn conformity(
    submissions: &[RankedSubmission],
    ctx: &GroupContext,
    min_shared_items: usize,
    limit: usize,
) -> ConformityReport {
    let relative = ctx.relativize_all(submissions);
    let means = item_means(&relative);

    let mut entries: Vec<ConformityEntry> = relative
        .iter()
        .filter(|(_, ranks)| ranks.len() >= min_shared_items)
        .map(|(username, ranks)| ConformityEntry {
            username: username.clone(),
            deviation: round_to(mean_abs_deviation(ranks, |item_id| means.get(&item_id).copied()), 2),
            shared_items: ranks.len(),
        })
        .collect();

    entries.sort_by(|a, b| a.deviation.total_cmp(&b.deviation).then_with(|| a.username.cmp(&b.username)));

    ConformityReport {
        normies: entries.iter().take(limit).cloned().collect(),
        hipsters: entries.iter().rev().take(limit).cloned().collect(),
    }
}

fn mean_abs_deviation(ranks: &RankMap, reference: impl Fn(ItemId) -> Option<f64>) -> f64 {
    let deviations: Vec<f64> = ranks
        .iter()
        .filter_map(|(&item_id, &rank)| reference(item_id).map(|r| (rank - r).abs()))
        .collect();
    if deviations.is_empty() {
        return 0.0;
    }
    deviations.iter().sum::<f64>() / deviations.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::*;
    use crate::ranking::DivergenceMatrix;
    use crate::ranking::types::rank_map;
    use std::collections::{BTreeSet, HashMap};

    #[test]
    fn test_outliers_need_two_users() {
        let names = names();
        let ctx = GroupContext::from_items(items(&[X, Y, Z]), &names);
        let single = vec![RankedSubmission::new("alice", rank_map([(X, 1.0), (Y, 2.0)]))];

        assert!(outlier_users(&single, &ctx).is_empty());

        let users = outlier_users(&inverted_pair(), &ctx);
        assert_eq!(users.len(), 2);
        // |1-2| + |2-2| + |3-2| over 3 items
        assert_eq!(users[0].avg_deviation, 0.67);
    }

    #[test]
    fn test_head_to_head_inverted_pair() {
        let names = names();
        let ctx = GroupContext::from_items(items(&[X, Y, Z]), &names);

        let h2h = head_to_head(&inverted_pair(), &ctx, "alice", "bob").unwrap();

        assert_eq!(h2h.shared_items, 3);
        assert_eq!(h2h.differences[0].diff, 2.0);
        assert_eq!(h2h.differences[2].item_id, Y);
        assert_eq!(h2h.avg_diff, 1.33);
        assert_eq!(h2h.rms_diff, 1.63);
        // 100 * (1 - (4/3) / 1.5)
        assert_eq!(h2h.compatibility, 11.1);
    }

    #[test]
    fn test_head_to_head_unknown_user() {
        let names = names();
        let ctx = GroupContext::from_items(items(&[X, Y, Z]), &names);
        assert!(head_to_head(&inverted_pair(), &ctx, "alice", "carol").is_none());
    }

    #[test]
    fn test_user_match_skips_pairs_without_overlap() {
        let group: BTreeSet<ItemId> = (1..=4).collect();
        let submissions = vec![
            RankedSubmission::new("alice", rank_map([(1, 1.0), (2, 2.0)])),
            RankedSubmission::new("bob", rank_map([(1, 2.0), (2, 1.0)])),
            RankedSubmission::new("carol", rank_map([(1, 1.0), (2, 2.0)])),
            RankedSubmission::new("dave", rank_map([(3, 1.0), (4, 2.0)])),
        ];
        let report = DivergenceMatrix::compute(&submissions, &group).to_report();

        let matches = user_match(&report, "alice", 5).unwrap();

        let soulmates: Vec<&str> = matches.soulmates.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(soulmates, vec!["carol", "bob"]);
        assert_eq!(matches.nemeses[0].username, "bob");
        assert!(user_match(&report, "erin", 5).is_none());
    }

    #[test]
    fn test_conformity_threshold_and_order() {
        let names: HashMap<ItemId, String> = HashMap::new();
        let group: BTreeSet<ItemId> = (1..=5).collect();
        let ctx = GroupContext::from_items(group, &names);
        let straight = || rank_map((1..=5).map(|i| (i, i as f64)));
        let submissions = vec![
            RankedSubmission::new("alice", straight()),
            RankedSubmission::new("bob", straight()),
            RankedSubmission::new("carol", rank_map((1..=5).map(|i| (i, 6.0 - i as f64)))),
            RankedSubmission::new("dave", rank_map([(1, 1.0), (2, 2.0)])),
        ];

        let report = conformity(&submissions, &ctx, 5, 10);

        assert_eq!(report.normies.len(), 3);
        assert!(report.normies.iter().all(|e| e.username != "dave"));
        assert_eq!(report.hipsters[0].username, "carol");
        assert_eq!(report.normies[0].username, "alice");
    }
}
