//! Read-only statistics over a snapshot of submissions.
//!
//! Every function here is pure: it takes the latest valid ranking of each
//! user plus a group definition and never touches storage. Rankings are
//! relativized to the group on every call.

pub mod consensus;
pub mod controversy;
pub mod disputes;
pub mod oshi;
pub mod popularity;
pub mod spice;
pub mod takes;
pub mod users;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::database::Group;
use crate::ranking::{ItemId, Rank, RankMap, RankedSubmission, relativize};

pub use consensus::{ConsensusEntry, ConsensusExtremes, community_rankings, top_bottom_consensus};
pub use controversy::{ControversyEntry, controversy_report};
pub use disputes::{ComebackItem, DisputedItem, comeback_items, most_disputed};
pub use oshi::{ArtistBias, ArtistSubset, OshiBiasReport, oshi_bias};
pub use popularity::{SubunitPopularity, subunit_popularity};
pub use spice::{UserSpice, group_spice, spice_meter};
pub use takes::{HotTake, TakeType, hot_takes};
pub use users::{
    ConformityReport, HeadToHead, OutlierUser, UserMatch, conformity, head_to_head, outlier_users,
    user_match,
};

/// Kinds of analysis that are persisted by the recompute job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    CommunityRank,
    Divergence,
    Controversy,
    Takes,
    Disputed,
    Consensus,
    Outliers,
    Comebacks,
    Subunits,
    Conformity,
    Spice,
}

impl AnalysisKind {
    /// Kinds stored per group; `Spice` is stored once per collection
    pub const GROUP_SCOPED: [AnalysisKind; 10] = [
        AnalysisKind::CommunityRank,
        AnalysisKind::Divergence,
        AnalysisKind::Controversy,
        AnalysisKind::Takes,
        AnalysisKind::Disputed,
        AnalysisKind::Consensus,
        AnalysisKind::Outliers,
        AnalysisKind::Comebacks,
        AnalysisKind::Subunits,
        AnalysisKind::Conformity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::CommunityRank => "COMMUNITY_RANK",
            AnalysisKind::Divergence => "DIVERGENCE",
            AnalysisKind::Controversy => "CONTROVERSY",
            AnalysisKind::Takes => "TAKES",
            AnalysisKind::Disputed => "DISPUTED",
            AnalysisKind::Consensus => "CONSENSUS",
            AnalysisKind::Outliers => "OUTLIERS",
            AnalysisKind::Comebacks => "COMEBACKS",
            AnalysisKind::Subunits => "SUBUNITS",
            AnalysisKind::Conformity => "CONFORMITY",
            AnalysisKind::Spice => "SPICE",
        }
    }

    /// All-pairs kinds get the longer cache TTL
    pub fn is_heavy(&self) -> bool {
        matches!(self, AnalysisKind::Divergence | AnalysisKind::Spice)
    }
}

/// A group's item set plus the names used in reports
#[derive(Debug, Clone)]
pub struct GroupContext<'a> {
    pub items: BTreeSet<ItemId>,
    pub names: &'a HashMap<ItemId, String>,
}

impl<'a> GroupContext<'a> {
    pub fn new(group: &Group, names: &'a HashMap<ItemId, String>) -> Self {
        Self {
            items: group.item_set(),
            names,
        }
    }

    pub fn from_items(items: BTreeSet<ItemId>, names: &'a HashMap<ItemId, String>) -> Self {
        Self { items, names }
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn name_of(&self, item_id: ItemId) -> String {
        self.names
            .get(&item_id)
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Relativized rankings of users with at least one item in the group
    pub fn relativize_all(&self, submissions: &[RankedSubmission]) -> Vec<(String, RankMap)> {
        submissions
            .iter()
            .map(|s| (s.username.clone(), relativize(&s.rankings, &self.items)))
            .filter(|(_, ranks)| !ranks.is_empty())
            .collect()
    }
}

/// Per-item list of `(username, rank)` over relativized rankings
pub(crate) fn ranks_by_item(relative: &[(String, RankMap)]) -> BTreeMap<ItemId, Vec<(&str, Rank)>> {
    let mut by_item: BTreeMap<ItemId, Vec<(&str, Rank)>> = BTreeMap::new();
    for (username, ranks) in relative {
        for (&item_id, &rank) in ranks {
            by_item.entry(item_id).or_default().push((username.as_str(), rank));
        }
    }
    by_item
}

/// Mean relativized rank per item, over users who ranked it
pub(crate) fn item_means(relative: &[(String, RankMap)]) -> BTreeMap<ItemId, f64> {
    ranks_by_item(relative)
        .into_iter()
        .map(|(item_id, ranks)| {
            let sum: f64 = ranks.iter().map(|(_, r)| r).sum();
            (item_id, sum / ranks.len() as f64)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::ranking::types::rank_map;

    pub const X: ItemId = 1;
    pub const Y: ItemId = 2;
    pub const Z: ItemId = 3;

    pub fn names() -> HashMap<ItemId, String> {
        HashMap::from([(X, "X".to_string()), (Y, "Y".to_string()), (Z, "Z".to_string())])
    }

    pub fn items(ids: &[ItemId]) -> BTreeSet<ItemId> {
        ids.iter().copied().collect()
    }

    /// Two users with fully inverted rankings of X, Y, Z
    pub fn inverted_pair() -> Vec<RankedSubmission> {
        vec![
            RankedSubmission::new("alice", rank_map([(X, 1.0), (Y, 2.0), (Z, 3.0)])),
            RankedSubmission::new("bob", rank_map([(X, 3.0), (Y, 2.0), (Z, 1.0)])),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_item_means_over_relativized_ranks() {
        let names = names();
        let ctx = GroupContext::from_items(items(&[X, Y, Z]), &names);
        let relative = ctx.relativize_all(&inverted_pair());

        let means = item_means(&relative);
        assert_eq!(means[&X], 2.0);
        assert_eq!(means[&Y], 2.0);
        assert_eq!(means[&Z], 2.0);
    }

    #[test]
    fn test_kind_names_are_unique() {
        let mut names: Vec<&str> = AnalysisKind::GROUP_SCOPED.iter().map(|k| k.as_str()).collect();
        names.push(AnalysisKind::Spice.as_str());
        let count = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), count);
    }
}
