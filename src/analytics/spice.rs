use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::{GroupContext, ranks_by_item};
use crate::database::Group;
use crate::ranking::dispersion::{rms, round_to};
use crate::ranking::{ItemId, RankedSubmission};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSpice {
    pub username: String,
    pub global_spice: f64,
    pub group_spice: BTreeMap<String, f64>,
}

/// Spice of every user in one group, in `[0, 100]`.
///
/// A user's spice is the RMS distance of their ranks from the mean of the
/// other users, normalized by the RMS expected for a random ranking of the
/// whole group. Users with fewer than two comparable items get no value.
pub fn group_spice(submissions: &[RankedSubmission], items: &BTreeSet<ItemId>) -> BTreeMap<String, f64> {
    let names = HashMap::new();
    let ctx = GroupContext::from_items(items.clone(), &names);
    let relative = ctx.relativize_all(submissions);
    let by_item = ranks_by_item(&relative);

    let mut spice = BTreeMap::new();
    for (username, ranks) in &relative {
        let diffs: Vec<f64> = ranks
            .iter()
            .filter_map(|(item_id, &rank)| {
                let others: Vec<f64> = by_item
                    .get(item_id)?
                    .iter()
                    .filter(|(other, _)| *other != username.as_str())
                    .map(|(_, r)| *r)
                    .collect();
                if others.is_empty() {
                    return None;
                }
                let others_mean = others.iter().sum::<f64>() / others.len() as f64;
                Some(rank - others_mean)
            })
            .collect();

        if diffs.len() < 2 {
            continue;
        }

        let max_rms = items.len() as f64 / 3f64.sqrt();
        let value = (rms(&diffs) / max_rms * 100.0).clamp(0.0, 100.0);
        spice.insert(username.clone(), value);
    }
    spice
}

/// Collection-wide spice: per-group values weighted by group size.
/// `snapshot_for` yields the rankings that count for a group.
pub fn spice_meter<F>(groups: &[Group], snapshot_for: F) -> Vec<UserSpice>
where
    F: Fn(&Group) -> Vec<RankedSubmission>,
{
    let mut per_user: BTreeMap<String, (f64, usize, BTreeMap<String, f64>)> = BTreeMap::new();

    for group in groups {
        let weight = group.size();
        if weight == 0 {
            continue;
        }
        for (username, value) in group_spice(&snapshot_for(group), &group.item_set()) {
            let entry = per_user.entry(username).or_default();
            entry.0 += value * weight as f64;
            entry.1 += weight;
            entry.2.insert(group.name.clone(), round_to(value, 2));
        }
    }

    let mut meter: Vec<UserSpice> = per_user
        .into_iter()
        .map(|(username, (weighted_sum, total_weight, group_spice))| UserSpice {
            username,
            global_spice: round_to(weighted_sum / total_weight as f64, 2),
            group_spice,
        })
        .collect();

    meter.sort_by(|a, b| {
        b.global_spice
            .total_cmp(&a.global_spice)
            .then_with(|| a.username.cmp(&b.username))
    });
    meter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::*;
    use crate::ranking::types::rank_map;
    use proptest::prelude::*;

    fn group(id: i64, name: &str, item_ids: &[ItemId]) -> Group {
        Group {
            id,
            collection_id: 1,
            name: name.to_string(),
            item_ids: item_ids.to_vec(),
            is_subunit: false,
        }
    }

    #[test]
    fn test_agreeing_users_have_no_spice() {
        let submissions = vec![
            RankedSubmission::new("alice", rank_map([(X, 1.0), (Y, 2.0), (Z, 3.0)])),
            RankedSubmission::new("bob", rank_map([(X, 1.0), (Y, 2.0), (Z, 3.0)])),
        ];

        let spice = group_spice(&submissions, &items(&[X, Y, Z]));
        assert_eq!(spice["alice"], 0.0);
        assert_eq!(spice["bob"], 0.0);
    }

    #[test]
    fn test_inverted_pair_spice() {
        let spice = group_spice(&inverted_pair(), &items(&[X, Y, Z]));

        // diffs [-2, 0, 2]: rms = sqrt(8/3), max = 3 / sqrt(3)
        let expected = (8f64 / 3.0).sqrt() / (3.0 / 3f64.sqrt()) * 100.0;
        assert!((spice["alice"] - expected).abs() < 1e-9);
        assert!((spice["bob"] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_partial_ranking_normalizes_by_group_size() {
        // both rank 3 of the 4 group items; the maximum follows the group
        let spice = group_spice(&inverted_pair(), &items(&[X, Y, Z, 99]));

        let expected = (8f64 / 3.0).sqrt() / (4.0 / 3f64.sqrt()) * 100.0;
        assert!((spice["alice"] - expected).abs() < 1e-9);
        assert!((spice["bob"] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_lonely_user_gets_no_value() {
        let submissions = vec![RankedSubmission::new("alice", rank_map([(X, 1.0), (Y, 2.0)]))];
        assert!(group_spice(&submissions, &items(&[X, Y])).is_empty());
    }

    #[test]
    fn test_meter_weights_by_group_size() {
        let submissions = vec![
            RankedSubmission::new("alice", rank_map([(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)])),
            RankedSubmission::new("bob", rank_map([(1, 1.0), (2, 2.0), (3, 4.0), (4, 3.0)])),
        ];
        let groups = vec![group(1, "pair", &[1, 2]), group(2, "quad", &[1, 2, 3, 4])];

        let meter = spice_meter(&groups, |_| submissions.clone());
        assert_eq!(meter.len(), 2);

        let alice = meter.iter().find(|u| u.username == "alice").unwrap();
        let pair = alice.group_spice["pair"];
        let quad = alice.group_spice["quad"];
        assert_eq!(pair, 0.0);
        assert!(quad > 0.0);
        assert!((alice.global_spice - round_to((pair * 2.0 + quad * 4.0) / 6.0, 2)).abs() <= 0.01);
    }

    proptest! {
        #[test]
        fn spice_stays_within_bounds(
            users in proptest::collection::vec(proptest::collection::vec(1u8..30, 1..20), 2..6),
            group_size in 1i64..20,
        ) {
            let group: BTreeSet<ItemId> = (0..group_size).collect();
            let submissions: Vec<RankedSubmission> = users
                .iter()
                .enumerate()
                .map(|(u, ranks)| {
                    let map = ranks.iter().enumerate().map(|(i, &r)| (i as ItemId, r as f64)).collect();
                    RankedSubmission::new(format!("u{u}"), map)
                })
                .collect();

            for value in group_spice(&submissions, &group).values() {
                prop_assert!((0.0..=100.0).contains(value));
            }
        }
    }
}
