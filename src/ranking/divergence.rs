use std::collections::{BTreeMap, BTreeSet};

use log::info;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::dispersion::{rms, round_to};
use super::relativize::relativize;
use super::types::{ItemId, RankMap, RankedSubmission};

/// Pairwise RMS rank distance between users over their shared items.
///
/// `distances` is symmetric with a zero diagonal. Pairs without any shared
/// item hold `0.0` there; `shared_items` tells them apart from agreement.
#[derive(Debug, Clone)]
pub struct DivergenceMatrix {
    pub users: Vec<String>,
    pub distances: Array2<f64>,
    pub shared_items: Array2<usize>,
}

/// Serialized form: nested maps keyed by username
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivergenceReport {
    pub matrix: BTreeMap<String, BTreeMap<String, f64>>,
    pub shared_items: BTreeMap<String, BTreeMap<String, usize>>,
}

impl DivergenceMatrix {
    /// Relativizes every submission to the group and compares all pairs.
    pub fn compute(submissions: &[RankedSubmission], group_items: &BTreeSet<ItemId>) -> Self {
        let relative = relativize_all(submissions, group_items);
        let users: Vec<String> = relative.keys().cloned().collect();
        let rankings: Vec<&RankMap> = relative.values().collect();
        let n_users = users.len();

        info!("Computing divergence for {} users over {} items", n_users, group_items.len());

        let mut distances = Array2::<f64>::zeros((n_users, n_users));
        let mut shared_items = Array2::<usize>::zeros((n_users, n_users));

        for i in 0..n_users {
            shared_items[[i, i]] = rankings[i].len();
            for j in (i + 1)..n_users {
                let (distance, shared) = pair_distance(rankings[i], rankings[j]);
                distances[[i, j]] = distance;
                distances[[j, i]] = distance;
                shared_items[[i, j]] = shared;
                shared_items[[j, i]] = shared;
            }
        }

        Self {
            users,
            distances,
            shared_items,
        }
    }

    pub fn index_of(&self, username: &str) -> Option<usize> {
        self.users.binary_search_by(|u| u.as_str().cmp(username)).ok()
    }

    /// `None` when the two users share no item (no signal).
    pub fn distance(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        if i != j && self.shared_items[[i, j]] == 0 {
            return None;
        }
        Some(self.distances[[i, j]])
    }

    pub fn to_report(&self) -> DivergenceReport {
        let mut report = DivergenceReport::default();

        for (i, user) in self.users.iter().enumerate() {
            let row = self
                .users
                .iter()
                .enumerate()
                .map(|(j, other)| (other.clone(), round_to(self.distances[[i, j]], 2)))
                .collect();
            let shared_row = self
                .users
                .iter()
                .enumerate()
                .map(|(j, other)| (other.clone(), self.shared_items[[i, j]]))
                .collect();

            report.matrix.insert(user.clone(), row);
            report.shared_items.insert(user.clone(), shared_row);
        }

        report
    }
}

fn relativize_all(
    submissions: &[RankedSubmission],
    group_items: &BTreeSet<ItemId>,
) -> BTreeMap<String, RankMap> {
    submissions
        .iter()
        .map(|s| (s.username.clone(), relativize(&s.rankings, group_items)))
        .filter(|(_, ranks)| !ranks.is_empty())
        .collect()
}

fn pair_distance(a: &RankMap, b: &RankMap) -> (f64, usize) {
    let diffs: Vec<f64> = a
        .iter()
        .filter_map(|(id, rank_a)| b.get(id).map(|rank_b| rank_a - rank_b))
        .collect();

    (rms(&diffs), diffs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::types::rank_map;
    use proptest::prelude::*;

    fn group(ids: &[ItemId]) -> BTreeSet<ItemId> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_inverted_rankings() {
        let submissions = vec![
            RankedSubmission::new("alice", rank_map([(1, 1.0), (2, 2.0), (3, 3.0)])),
            RankedSubmission::new("bob", rank_map([(1, 3.0), (2, 2.0), (3, 1.0)])),
        ];

        let matrix = DivergenceMatrix::compute(&submissions, &group(&[1, 2, 3]));
        let d = matrix.distance("alice", "bob").unwrap();

        assert!((d - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(matrix.to_report().matrix["alice"]["bob"], 1.63);
    }

    #[test]
    fn test_no_shared_items_is_representable() {
        let submissions = vec![
            RankedSubmission::new("alice", rank_map([(1, 1.0), (2, 2.0)])),
            RankedSubmission::new("bob", rank_map([(3, 1.0), (4, 2.0)])),
        ];

        let matrix = DivergenceMatrix::compute(&submissions, &group(&[1, 2, 3, 4]));

        assert_eq!(matrix.distance("alice", "bob"), None);
        let report = matrix.to_report();
        assert_eq!(report.matrix["alice"]["bob"], 0.0);
        assert_eq!(report.shared_items["alice"]["bob"], 0);
    }

    #[test]
    fn test_users_without_group_items_are_omitted() {
        let submissions = vec![
            RankedSubmission::new("alice", rank_map([(1, 1.0)])),
            RankedSubmission::new("carol", rank_map([(9, 1.0)])),
        ];

        let matrix = DivergenceMatrix::compute(&submissions, &group(&[1, 2]));
        assert_eq!(matrix.users, vec!["alice".to_string()]);
    }

    proptest! {
        #[test]
        fn matrix_is_symmetric_with_zero_diagonal(
            users in proptest::collection::vec(proptest::collection::vec(1u8..30, 1..12), 1..8),
        ) {
            let submissions: Vec<RankedSubmission> = users
                .iter()
                .enumerate()
                .map(|(u, ranks)| {
                    let map = ranks.iter().enumerate().map(|(i, &r)| (i as ItemId, r as f64)).collect();
                    RankedSubmission::new(format!("user{u}"), map)
                })
                .collect();
            let items: BTreeSet<ItemId> = (0..12).collect();

            let matrix = DivergenceMatrix::compute(&submissions, &items);
            let n = matrix.users.len();
            for i in 0..n {
                prop_assert_eq!(matrix.distances[[i, i]], 0.0);
                for j in 0..n {
                    prop_assert_eq!(matrix.distances[[i, j]], matrix.distances[[j, i]]);
                    prop_assert!(matrix.distances[[i, j]] >= 0.0);
                }
            }
        }
    }
}
