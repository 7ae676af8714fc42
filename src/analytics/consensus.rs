use serde::{Deserialize, Serialize};

use super::{GroupContext, ranks_by_item};
use crate::ranking::dispersion::{mean, round_to, sample_std_dev};
use crate::ranking::{ItemId, RankedSubmission};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusEntry {
    pub position: usize,
    pub item_id: ItemId,
    pub item_name: String,
    pub average: f64,
    pub total_points: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementEntry {
    pub item_id: ItemId,
    pub item_name: String,
    pub average: f64,
    pub std_dev: f64,
    pub agreement: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsensusExtremes {
    pub top: Vec<AgreementEntry>,
    pub bottom: Vec<AgreementEntry>,
}

struct ItemTally {
    item_id: ItemId,
    item_name: String,
    sum: f64,
    count: usize,
    mean: f64,
}

/// Community leaderboard: one entry per group item, best average first.
///
/// Items nobody ranked sit at the worst possible rank (the group size).
pub fn community_rankings(submissions: &[RankedSubmission], ctx: &GroupContext) -> Vec<ConsensusEntry> {
    tally_items(submissions, ctx)
        .into_iter()
        .enumerate()
        .map(|(idx, tally)| ConsensusEntry {
            position: idx + 1,
            item_id: tally.item_id,
            item_name: tally.item_name,
            average: round_to(tally.mean, 2),
            total_points: round_to(tally.sum, 2),
            count: tally.count,
        })
        .collect()
}

fn tally_items(submissions: &[RankedSubmission], ctx: &GroupContext) -> Vec<ItemTally> {
    let relative = ctx.relativize_all(submissions);
    let by_item = ranks_by_item(&relative);
    let worst_rank = ctx.size() as f64;

    let mut tallies: Vec<ItemTally> = ctx
        .items
        .iter()
        .map(|&item_id| {
            let ranks = by_item.get(&item_id);
            let sum: f64 = ranks.map_or(0.0, |r| r.iter().map(|(_, rank)| rank).sum::<f64>());
            let count = ranks.map_or(0, |r| r.len());
            let mean = if count > 0 { sum / count as f64 } else { worst_rank };

            ItemTally {
                item_id,
                item_name: ctx.name_of(item_id),
                sum,
                count,
                mean,
            }
        })
        .collect();

    tallies.sort_by(|a, b| {
        a.mean
            .total_cmp(&b.mean)
            .then_with(|| a.item_name.cmp(&b.item_name))
            .then(a.item_id.cmp(&b.item_id))
    });
    tallies
}

/// Best and worst consensus items among those ranked by at least two users,
/// with how strongly people agree on them.
pub fn top_bottom_consensus(
    submissions: &[RankedSubmission],
    ctx: &GroupContext,
    limit: usize,
) -> ConsensusExtremes {
    let relative = ctx.relativize_all(submissions);
    let by_item = ranks_by_item(&relative);

    let mut entries: Vec<(f64, AgreementEntry)> = by_item
        .iter()
        .filter(|(_, ranks)| ranks.len() >= 2)
        .map(|(&item_id, ranks)| {
            let values: Vec<f64> = ranks.iter().map(|(_, r)| *r).collect();
            let avg = mean(&values);
            let std_dev = sample_std_dev(&values, avg);
            let entry = AgreementEntry {
                item_id,
                item_name: ctx.name_of(item_id),
                average: round_to(avg, 2),
                std_dev: round_to(std_dev, 2),
                agreement: round_to((100.0 - 2.5 * std_dev).max(0.0), 1),
                count: values.len(),
            };
            (avg, entry)
        })
        .collect();

    entries.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.item_name.cmp(&b.1.item_name)));

    let limit = limit.min(entries.len() / 2);
    let sorted: Vec<AgreementEntry> = entries.into_iter().map(|(_, e)| e).collect();

    ConsensusExtremes {
        top: sorted[..limit].to_vec(),
        bottom: sorted[sorted.len() - limit..].iter().rev().cloned().collect(),
    }
}
