use serde::{Deserialize, Serialize};

use super::{GroupContext, ranks_by_item};
use crate::config::settings::ControversySettings;
use crate::ranking::dispersion::round_to;
use crate::ranking::{ControversyIndex, ItemId, RankedSubmission};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControversyEntry {
    pub item_id: ItemId,
    pub item_name: String,
    pub avg_rank: f64,
    pub std_dev: f64,
    pub iqr: f64,
    pub cv: f64,
    pub bimodality: f64,
    pub controversy_score: f64,
    pub count: usize,
}

/// Controversy index of every item ranked by at least two users,
/// most controversial first.
pub fn controversy_report(
    submissions: &[RankedSubmission],
    ctx: &GroupContext,
    settings: &ControversySettings,
) -> Vec<ControversyEntry> {
    let relative = ctx.relativize_all(submissions);

    let mut entries: Vec<ControversyEntry> = ranks_by_item(&relative)
        .into_iter()
        .filter(|(_, ranks)| ranks.len() >= 2)
        .map(|(item_id, ranks)| {
            let values: Vec<f64> = ranks.iter().map(|(_, r)| *r).collect();
            let index = ControversyIndex::calculate(&values, settings);

            ControversyEntry {
                item_id,
                item_name: ctx.name_of(item_id),
                avg_rank: round_to(index.mean, 2),
                std_dev: round_to(index.std_dev, 2),
                iqr: round_to(index.iqr, 2),
                cv: round_to(index.cv, 4),
                bimodality: index.bimodality_indicator,
                controversy_score: round_to(index.score, 4),
                count: values.len(),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.controversy_score
            .total_cmp(&a.controversy_score)
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    entries
}
