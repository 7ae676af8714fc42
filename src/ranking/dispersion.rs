use serde::{Deserialize, Serialize};

use crate::config::settings::ControversySettings;

/// Scale-invariant dispersion of the ranks one item received
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControversyIndex {
    pub mean: f64,
    pub std_dev: f64,
    pub cv: f64,
    pub iqr: f64,
    pub bimodality_indicator: f64,
    pub score: f64,
}

impl Default for ControversyIndex {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std_dev: 0.0,
            cv: 0.0,
            iqr: 0.0,
            bimodality_indicator: 1.0,
            score: 0.0,
        }
    }
}

impl ControversyIndex {
    /// Fewer than two ranks yields the all-zero default.
    pub fn calculate(ranks: &[f64], settings: &ControversySettings) -> Self {
        if ranks.len() < 2 {
            return Self::default();
        }

        let mean = mean(ranks);
        let std_dev = sample_std_dev(ranks, mean);
        let cv = safe_ratio(std_dev, mean, settings.mean_epsilon);

        let (q1, q3) = index_quartiles(ranks);
        let iqr = q3 - q1;

        let bimodality_ratio = safe_ratio(iqr, mean, settings.mean_epsilon);
        let bimodality_indicator = if bimodality_ratio > settings.bimodality_threshold {
            settings.bimodality_multiplier
        } else {
            1.0
        };

        Self {
            mean,
            std_dev,
            cv,
            iqr,
            bimodality_indicator,
            score: cv * bimodality_indicator,
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator); zero below two values.
pub fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq_diff: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq_diff / (values.len() - 1) as f64).sqrt()
}

/// Root mean square of a list of differences.
pub fn rms(diffs: &[f64]) -> f64 {
    if diffs.is_empty() {
        return 0.0;
    }
    (diffs.iter().map(|d| d * d).sum::<f64>() / diffs.len() as f64).sqrt()
}

/// Rounds for presentation, the way reported metrics are stored.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn safe_ratio(numerator: f64, denominator: f64, epsilon: f64) -> f64 {
    if denominator > epsilon {
        numerator / denominator
    } else {
        0.0
    }
}

// Quartiles at floor(n/4) and floor(3n/4) of the sorted list, no interpolation
fn index_quartiles(values: &[f64]) -> (f64, f64) {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    (sorted[n / 4], sorted[(3 * n) / 4])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn settings() -> ControversySettings {
        ControversySettings::default()
    }

    #[test]
    fn test_two_opposite_ranks() {
        let index = ControversyIndex::calculate(&[1.0, 3.0], &settings());

        assert_eq!(index.mean, 2.0);
        assert!((index.std_dev - 2f64.sqrt()).abs() < 1e-12);
        assert!((index.cv - 0.7071).abs() < 1e-4);
        assert_eq!(index.iqr, 2.0);
        assert_eq!(index.bimodality_indicator, 1.5);
        assert!((index.score - 1.0607).abs() < 1e-4);
    }

    #[test]
    fn test_narrow_spread_is_not_bimodal() {
        let index = ControversyIndex::calculate(&[10.0, 11.0, 10.0, 11.0], &settings());
        assert_eq!(index.bimodality_indicator, 1.0);
        assert!((index.score - index.cv).abs() < 1e-12);
    }

    #[test]
    fn test_single_rank_is_default() {
        assert_eq!(ControversyIndex::calculate(&[4.0], &settings()), ControversyIndex::default());
        assert_eq!(ControversyIndex::calculate(&[], &settings()), ControversyIndex::default());
    }

    #[test]
    fn test_threshold_is_configurable() {
        let strict = ControversySettings {
            bimodality_threshold: 5.0,
            ..ControversySettings::default()
        };
        let index = ControversyIndex::calculate(&[1.0, 3.0], &strict);
        assert_eq!(index.bimodality_indicator, 1.0);
    }

    #[test]
    fn test_rms() {
        assert!((rms(&[2.0, 0.0, 2.0]) - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(rms(&[]), 0.0);
    }

    proptest! {
        #[test]
        fn score_is_never_negative(ranks in proptest::collection::vec(1.0f64..300.0, 2..50)) {
            let index = ControversyIndex::calculate(&ranks, &settings());
            prop_assert!(index.score >= 0.0);
        }

        #[test]
        fn identical_ranks_have_zero_score(rank in 1u16..300, n in 2usize..40) {
            let ranks = vec![rank as f64; n];
            let index = ControversyIndex::calculate(&ranks, &settings());
            prop_assert_eq!(index.score, 0.0);
        }
    }
}
