use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::artists_for;
use crate::database::Group;
use crate::ranking::dispersion::{mean, round_to};
use crate::ranking::{ItemId, RankMap};

/// An artist and the items they sing
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistSubset {
    pub name: String,
    pub character: Option<String>,
    pub item_ids: BTreeSet<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistBias {
    pub artist: String,
    pub character: Option<String>,
    pub avg_rank: f64,
    pub bias: f64,
    pub items_ranked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OshiBiasReport {
    pub username: String,
    pub global_avg: f64,
    pub biases: Vec<ArtistBias>,
}

/// Resolves the artist table of a collection against its groups.
///
/// Mapped artists whose group is missing are dropped. Subunit groups without
/// a mapping are added as artists under their own name.
pub fn artist_subsets(collection: &str, groups: &[Group]) -> Vec<ArtistSubset> {
    let mut subsets: Vec<ArtistSubset> = artists_for(collection)
        .into_iter()
        .filter_map(|artist| {
            let group = groups.iter().find(|g| g.name == artist.group_name)?;
            Some(ArtistSubset {
                name: artist.name.to_string(),
                character: artist.character.map(str::to_string),
                item_ids: group.item_set(),
            })
        })
        .collect();

    let mapped: BTreeSet<String> = artists_for(collection)
        .iter()
        .map(|a| a.group_name.to_string())
        .collect();
    subsets.extend(
        groups
            .iter()
            .filter(|g| g.is_subunit && !mapped.contains(&g.name))
            .map(|g| ArtistSubset {
                name: g.name.clone(),
                character: None,
                item_ids: g.item_set(),
            }),
    );
    subsets
}

/// Positive bias means the user ranks an artist better than their own
/// average. Computed over the stored ranks of one submission.
pub fn oshi_bias(username: &str, rankings: &RankMap, artists: &[ArtistSubset]) -> Option<OshiBiasReport> {
    if rankings.is_empty() {
        return None;
    }
    let all: Vec<f64> = rankings.values().copied().collect();
    let global_avg = mean(&all);

    let mut biases: Vec<ArtistBias> = artists
        .iter()
        .filter_map(|artist| {
            let ranks: Vec<f64> = artist
                .item_ids
                .iter()
                .filter_map(|id| rankings.get(id).copied())
                .collect();
            if ranks.is_empty() {
                return None;
            }
            let avg_rank = mean(&ranks);

            Some(ArtistBias {
                artist: artist.name.clone(),
                character: artist.character.clone(),
                avg_rank: round_to(avg_rank, 2),
                bias: round_to(global_avg - avg_rank, 2),
                items_ranked: ranks.len(),
            })
        })
        .collect();

    biases.sort_by(|a, b| b.bias.total_cmp(&a.bias).then_with(|| a.artist.cmp(&b.artist)));

    Some(OshiBiasReport {
        username: username.to_string(),
        global_avg: round_to(global_avg, 2),
        biases,
    })
}
