use super::types::{ItemId, Rank, RankMap};

/// Converts raw positions (possibly with duplicates) into mean ranks.
///
/// Items sharing a position occupy a block of consecutive final positions
/// and each receives the mean of that block:
/// `{A: 1, B: 1, C: 3}` becomes `{A: 1.5, B: 1.5, C: 3.0}`.
pub fn resolve_ties(positions: &RankMap) -> RankMap {
    fractional_ranks(positions.iter().map(|(&id, &rank)| (id, rank)))
}

/// Fractional ranking over arbitrary `(item, rank)` pairs.
///
/// Tie groups are formed by exact equality of the input rank and processed
/// in ascending order. A group of `c` items starting at running position
/// `pos` gets `(pos + pos + c - 1) / 2`.
pub fn fractional_ranks<I>(entries: I) -> RankMap
where
    I: IntoIterator<Item = (ItemId, Rank)>,
{
    let mut sorted: Vec<(ItemId, Rank)> = entries.into_iter().collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut result = RankMap::new();
    let mut position = 1usize;

    for block in sorted.chunk_by(|a, b| a.1 == b.1) {
        let mean_rank = block_mean(position, block.len());
        for &(item_id, _) in block {
            result.insert(item_id, mean_rank);
        }
        position += block.len();
    }

    result
}

fn block_mean(start: usize, count: usize) -> Rank {
    (start + start + count - 1) as f64 / 2.0
}
