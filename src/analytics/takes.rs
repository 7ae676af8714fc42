use serde::{Deserialize, Serialize};

use super::{GroupContext, item_means};
use crate::ranking::dispersion::round_to;
use crate::ranking::{ItemId, RankedSubmission};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TakeType {
    /// Ranked worse than the community does
    HotTake,
    /// Ranked better than the community does
    Glaze,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotTake {
    pub username: String,
    pub item_id: ItemId,
    pub item_name: String,
    pub user_rank: f64,
    pub group_avg: f64,
    pub delta: f64,
    pub score: f64,
    pub take_type: TakeType,
}

/// Every (user, item) deviation from the item mean, scaled to the group
/// size, largest magnitude first.
pub fn hot_takes(submissions: &[RankedSubmission], ctx: &GroupContext) -> Vec<HotTake> {
    let group_size = ctx.size();
    if group_size == 0 {
        return Vec::new();
    }

    let relative = ctx.relativize_all(submissions);
    let means = item_means(&relative);

    let mut takes: Vec<HotTake> = relative
        .iter()
        .flat_map(|(username, ranks)| {
            let means = &means;
            ranks.iter().map(move |(&item_id, &user_rank)| {
                let group_avg = means.get(&item_id).copied().unwrap_or(user_rank);
                let delta = user_rank - group_avg;
                let score = delta / group_size as f64 * 100.0;

                HotTake {
                    username: username.clone(),
                    item_id,
                    item_name: ctx.name_of(item_id),
                    user_rank,
                    group_avg: round_to(group_avg, 2),
                    delta: round_to(delta, 2),
                    score: round_to(score, 2),
                    take_type: if score > 0.0 { TakeType::HotTake } else { TakeType::Glaze },
                }
            })
        })
        .collect();

    takes.sort_by(|a, b| {
        b.score
            .abs()
            .total_cmp(&a.score.abs())
            .then_with(|| a.username.cmp(&b.username))
            .then(a.item_id.cmp(&b.item_id))
    });
    takes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::*;

    #[test]
    fn test_inverted_pair_takes() {
        let names = names();
        let ctx = GroupContext::from_items(items(&[X, Y, Z]), &names);

        let takes = hot_takes(&inverted_pair(), &ctx);

        assert_eq!(takes.len(), 6);
        // alice on Z: 3 - 2 = 1, scaled by 3 items
        let top = &takes[0];
        assert_eq!(top.score.abs(), 33.33);
        assert!(takes.iter().filter(|t| t.score.abs() == 33.33).count() == 4);

        let alice_z = takes
            .iter()
            .find(|t| t.username == "alice" && t.item_id == Z)
            .unwrap();
        assert_eq!(alice_z.take_type, TakeType::HotTake);
        assert_eq!(alice_z.delta, 1.0);

        let alice_x = takes
            .iter()
            .find(|t| t.username == "alice" && t.item_id == X)
            .unwrap();
        assert_eq!(alice_x.take_type, TakeType::Glaze);
    }

    #[test]
    fn test_take_type_serializes_screaming_case() {
        assert_eq!(serde_json::to_string(&TakeType::HotTake).unwrap(), "\"HOT_TAKE\"");
        assert_eq!(serde_json::to_string(&TakeType::Glaze).unwrap(), "\"GLAZE\"");
    }
}
