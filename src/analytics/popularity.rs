use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::GroupContext;
use crate::database::Group;
use crate::ranking::dispersion::{mean, round_to, sample_std_dev};
use crate::ranking::{ItemId, RankedSubmission};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubunitPopularity {
    pub subunit: String,
    pub avg_rank: f64,
    pub std_dev: f64,
    pub item_count: usize,
    pub rank_count: usize,
}

/// How each subunit's items fare inside the target group.
///
/// Ranks are relativized to the target group, not to the subunit, so a
/// subunit that is loved overall lands near the top.
pub fn subunit_popularity(
    submissions: &[RankedSubmission],
    ctx: &GroupContext,
    subunits: &[Group],
) -> Vec<SubunitPopularity> {
    let relative = ctx.relativize_all(submissions);

    let mut results: Vec<SubunitPopularity> = subunits
        .iter()
        .filter(|g| g.is_subunit)
        .filter_map(|subunit| {
            let members: BTreeSet<ItemId> = subunit.item_set().intersection(&ctx.items).copied().collect();
            let ranks: Vec<f64> = relative
                .iter()
                .flat_map(|(_, ranks)| members.iter().filter_map(|id| ranks.get(id).copied()))
                .collect();
            if ranks.is_empty() {
                return None;
            }

            let avg = mean(&ranks);
            Some(SubunitPopularity {
                subunit: subunit.name.clone(),
                avg_rank: round_to(avg, 2),
                std_dev: round_to(sample_std_dev(&ranks, avg), 2),
                item_count: members.len(),
                rank_count: ranks.len(),
            })
        })
        .collect();

    results.sort_by(|a, b| a.avg_rank.total_cmp(&b.avg_rank).then_with(|| a.subunit.cmp(&b.subunit)));
    results
}
