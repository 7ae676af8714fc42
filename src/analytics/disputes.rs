use serde::{Deserialize, Serialize};

use super::{GroupContext, ranks_by_item};
use crate::ranking::dispersion::{mean, round_to};
use crate::ranking::{ItemId, RankedSubmission};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputedItem {
    pub item_id: ItemId,
    pub item_name: String,
    pub min_rank: f64,
    pub max_rank: f64,
    pub spread: f64,
    pub lover: String,
    pub hater: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComebackItem {
    pub item_id: ItemId,
    pub item_name: String,
    pub avg_rank: f64,
    pub top_third_avg: f64,
    pub bottom_third_avg: f64,
    pub gap: f64,
    pub gap_ratio: f64,
    pub count: usize,
}

/// Items with the widest gap between their best and worst rank.
///
/// `lover` ranked it best and `hater` worst; ties go to the first username.
pub fn most_disputed(submissions: &[RankedSubmission], ctx: &GroupContext) -> Vec<DisputedItem> {
    let relative = ctx.relativize_all(submissions);

    let mut items: Vec<DisputedItem> = ranks_by_item(&relative)
        .into_iter()
        .filter(|(_, ranks)| ranks.len() >= 2)
        .filter_map(|(item_id, ranks)| {
            let (lover, min_rank) = ranks
                .iter()
                .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)))?;
            let (hater, max_rank) = ranks
                .iter()
                .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(a.0)))?;

            Some(DisputedItem {
                item_id,
                item_name: ctx.name_of(item_id),
                min_rank: *min_rank,
                max_rank: *max_rank,
                spread: max_rank - min_rank,
                lover: lover.to_string(),
                hater: hater.to_string(),
                count: ranks.len(),
            })
        })
        .collect();

    items.sort_by(|a, b| b.spread.total_cmp(&a.spread).then_with(|| a.item_name.cmp(&b.item_name)));
    items
}

/// Polarized items: ranked in the worse half overall, yet their fans rank
/// them far above their critics.
pub fn comeback_items(
    submissions: &[RankedSubmission],
    ctx: &GroupContext,
    min_gap_ratio: f64,
) -> Vec<ComebackItem> {
    let group_size = ctx.size() as f64;
    if group_size == 0.0 {
        return Vec::new();
    }
    let relative = ctx.relativize_all(submissions);

    let mut items: Vec<ComebackItem> = ranks_by_item(&relative)
        .into_iter()
        .filter(|(_, ranks)| ranks.len() >= 3)
        .filter_map(|(item_id, ranks)| {
            let mut values: Vec<f64> = ranks.iter().map(|(_, r)| *r).collect();
            values.sort_by(f64::total_cmp);

            let k = (values.len() / 3).max(1);
            let top_third_avg = mean(&values[..k]);
            let bottom_third_avg = mean(&values[values.len() - k..]);
            let avg_rank = mean(&values);
            let gap = bottom_third_avg - top_third_avg;
            let gap_ratio = gap / group_size;

            if avg_rank <= group_size / 2.0 || gap_ratio <= min_gap_ratio {
                return None;
            }

            Some(ComebackItem {
                item_id,
                item_name: ctx.name_of(item_id),
                avg_rank: round_to(avg_rank, 2),
                top_third_avg: round_to(top_third_avg, 2),
                bottom_third_avg: round_to(bottom_third_avg, 2),
                gap: round_to(gap, 2),
                gap_ratio: round_to(gap_ratio, 2),
                count: values.len(),
            })
        })
        .collect();

    items.sort_by(|a, b| b.gap.total_cmp(&a.gap).then_with(|| a.item_name.cmp(&b.item_name)));
    items
}
