use std::collections::BTreeSet;

use super::ties::fractional_ranks;
use super::types::{ItemId, RankMap};

/// Re-ranks a user's full ranking inside one group's item set.
///
/// Only items present in `group_items` survive; their original ranks decide
/// order and tie groups, and they are renumbered densely from 1 to K.
/// An empty result means the user has no data for this group.
pub fn relativize(full_rankings: &RankMap, group_items: &BTreeSet<ItemId>) -> RankMap {
    let filtered = full_rankings
        .iter()
        .filter(|(id, _)| group_items.contains(id))
        .map(|(&id, &rank)| (id, rank));

    fractional_ranks(filtered)
}
