use std::collections::BTreeMap;

pub type ItemId = i64;
pub type Rank = f64;
pub type RankMap = BTreeMap<ItemId, Rank>;

/// One user's latest valid ranking, as fed to the analytics suite
#[derive(Debug, Clone)]
pub struct RankedSubmission {
    pub username: String,
    pub rankings: RankMap,
}

impl RankedSubmission {
    pub fn new(username: impl Into<String>, rankings: RankMap) -> Self {
        Self {
            username: username.into(),
            rankings,
        }
    }
}

/// Builds a rank map from `(item, rank)` pairs. Handy for callers and tests.
pub fn rank_map<I>(pairs: I) -> RankMap
where
    I: IntoIterator<Item = (ItemId, Rank)>,
{
    pairs.into_iter().collect()
}
