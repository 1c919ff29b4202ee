//! Weighted selection engine
//!
//! Turns historical frequency and recency into per-number selection weights,
//! then samples a fixed plan of distinct numbers for one draw.
//!
//! Scores per number n in 1..=N:
//! - frequency: how often n appeared
//! - delay: draws since n last appeared (total draw count if never)
//!
//! Both are min-max normalized across 1..=N and averaged into a "hot score".
//! The weight is the uniform base rate skewed by `strength * 2 * (hot - 0.5)`,
//! floored at 5% of the base rate and renormalized to sum to 1.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::history::{DrawHistory, NumberField};
use crate::settings::DrawConfig;
use crate::sim::DrawPhase;

/// Default weighting strength
pub const DEFAULT_STAT_WEIGHT: f64 = 0.35;
/// Lowest weight as a fraction of the uniform base rate
const WEIGHT_FLOOR: f64 = 0.05;

/// Raw and normalized statistics, index `i` holds number `i + 1`
#[derive(Debug, Clone, PartialEq)]
pub struct NumberStats {
    pub freq: Vec<u32>,
    pub delay: Vec<u32>,
    pub freq_norm: Vec<f64>,
    pub delay_norm: Vec<f64>,
}

impl NumberStats {
    pub fn max_number(&self) -> u32 {
        self.freq.len() as u32
    }
}

/// Count occurrences and recency for numbers 1..=max_number.
///
/// Values outside the range are ignored.
pub fn build_stats(history: &DrawHistory, field: NumberField, max_number: u32) -> NumberStats {
    let n = max_number as usize;
    let mut freq = vec![0u32; n];
    let mut last_seen: Vec<Option<usize>> = vec![None; n];

    for (index, draw) in history.draws.iter().enumerate() {
        for &number in draw.field(field) {
            if (1..=max_number).contains(&number) {
                let slot = (number - 1) as usize;
                freq[slot] += 1;
                last_seen[slot] = Some(index);
            }
        }
    }

    let total = history.len();
    let delay: Vec<u32> = last_seen
        .iter()
        .map(|seen| match seen {
            Some(index) => (total - 1 - index) as u32,
            None => total as u32,
        })
        .collect();

    NumberStats {
        freq_norm: normalize(&freq),
        delay_norm: normalize(&delay),
        freq,
        delay,
    }
}

/// Min-max normalize to [0, 1]; a flat series maps to all zeros
fn normalize(values: &[u32]) -> Vec<f64> {
    let Some(&min) = values.iter().min() else {
        return Vec::new();
    };
    let max = values.iter().copied().max().unwrap_or(min);
    let range = (max - min).max(1) as f64;
    values.iter().map(|&v| (v - min) as f64 / range).collect()
}

/// Normalized selection weights, index `i` holds number `i + 1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberWeights {
    weights: Vec<f64>,
}

impl NumberWeights {
    /// Equal chance for every number
    pub fn uniform(max_number: u32) -> Self {
        let n = max_number as usize;
        Self {
            weights: vec![1.0 / n.max(1) as f64; n],
        }
    }

    pub fn from_stats(stats: &NumberStats, strength: f64) -> Self {
        let n = stats.freq_norm.len();
        if n == 0 {
            return Self { weights: Vec::new() };
        }
        let base = 1.0 / n as f64;

        let mut weights: Vec<f64> = stats
            .freq_norm
            .iter()
            .zip(&stats.delay_norm)
            .map(|(&f, &d)| {
                let hot = 0.5 * f + 0.5 * d;
                let delta = hot - 0.5;
                (base * (1.0 + strength * 2.0 * delta)).max(base * WEIGHT_FLOOR)
            })
            .collect();

        let sum: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }
        Self { weights }
    }

    /// Weight of number `n` (1-based); 0 outside the range
    pub fn weight(&self, n: u32) -> f64 {
        n.checked_sub(1)
            .and_then(|i| self.weights.get(i as usize))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn max_number(&self) -> u32 {
        self.weights.len() as u32
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }
}

/// Sample `amount` distinct numbers without replacement, in sampling order.
///
/// Each round draws a uniform value over the remaining mass and walks the
/// table of unchosen numbers. If the walk falls off the end (rounding), the
/// smallest unchosen number is taken.
///
/// The value is scaled by the unchosen mass only, never the full table, so
/// the fallback stays a rounding case and does not favor low numbers.
pub fn sample_distinct_weighted<R: Rng>(
    amount: usize,
    weights: &NumberWeights,
    rng: &mut R,
) -> Vec<u32> {
    let n = weights.weights.len();
    let mut picked = Vec::with_capacity(amount.min(n));
    let mut used = vec![false; n];

    while picked.len() < amount && picked.len() < n {
        let remaining: f64 = weights
            .weights
            .iter()
            .zip(&used)
            .filter(|(_, u)| !**u)
            .map(|(w, _)| *w)
            .sum();
        // Scaled to the unchosen mass on purpose; a raw [0, 1) value would
        // overshoot the walk and pile picks onto the fallback
        let r = rng.random::<f64>() * remaining;

        let mut acc = 0.0;
        let mut chosen = None;
        for (i, &w) in weights.weights.iter().enumerate() {
            if used[i] {
                continue;
            }
            acc += w;
            if r <= acc {
                chosen = Some(i);
                break;
            }
        }

        let chosen = chosen.or_else(|| used.iter().position(|u| !u));
        match chosen {
            Some(i) => {
                used[i] = true;
                picked.push(i as u32 + 1);
            }
            None => break,
        }
    }

    picked
}

/// Sample `amount` distinct numbers and return them ascending
pub fn draw_distinct_weighted<R: Rng>(
    amount: usize,
    weights: &NumberWeights,
    rng: &mut R,
) -> Vec<u32> {
    let mut picked = sample_distinct_weighted(amount, weights, rng);
    picked.sort_unstable();
    picked
}

/// Pre-computed numbers for one weighted draw.
///
/// `main` and `second` keep sampling order; that is the order the sequencer
/// realizes them in. Use the `sorted_*` accessors for presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawPlan {
    pub main: Vec<u32>,
    pub second: Vec<u32>,
}

impl DrawPlan {
    /// Planned number for the given phase and draw index
    pub fn planned(&self, phase: DrawPhase, index: usize) -> Option<u32> {
        match phase {
            DrawPhase::Main => self.main.get(index).copied(),
            DrawPhase::Second => self.second.get(index).copied(),
        }
    }

    pub fn sorted_main(&self) -> Vec<u32> {
        let mut v = self.main.clone();
        v.sort_unstable();
        v
    }

    pub fn sorted_second(&self) -> Vec<u32> {
        let mut v = self.second.clone();
        v.sort_unstable();
        v
    }
}

/// Build a weighted plan for one draw; `None` when nothing could be planned
pub fn prepare_plan<R: Rng>(
    history: &DrawHistory,
    config: &DrawConfig,
    strength: f64,
    rng: &mut R,
) -> Option<DrawPlan> {
    if history.is_empty() {
        log::warn!("No historical draws, weighted plan skipped");
        return None;
    }

    let main_weights = NumberWeights::from_stats(
        &build_stats(history, NumberField::Main, config.main_count),
        strength,
    );
    let second_weights = NumberWeights::from_stats(
        &build_stats(history, NumberField::Second, config.second_count),
        strength,
    );

    let plan = DrawPlan {
        main: sample_distinct_weighted(config.main_target as usize, &main_weights, rng),
        second: sample_distinct_weighted(config.second_target as usize, &second_weights, rng),
    };

    if plan.main.is_empty() {
        log::warn!("Weighted plan is empty, falling back to a random draw");
        return None;
    }

    log::info!(
        "Weighted plan: main {:?}, second {:?}",
        plan.sorted_main(),
        plan.sorted_second()
    );
    Some(plan)
}

/// One line of the statistics report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsRow {
    pub number: u32,
    pub weight: f64,
    pub percent: f64,
    pub freq: u32,
    pub delay: u32,
}

/// Per-number report sorted by descending weight
pub fn stats_table(
    history: &DrawHistory,
    field: NumberField,
    max_number: u32,
    strength: f64,
) -> Vec<StatsRow> {
    let stats = build_stats(history, field, max_number);
    let weights = NumberWeights::from_stats(&stats, strength);

    let mut rows: Vec<StatsRow> = (1..=max_number)
        .map(|n| {
            let i = (n - 1) as usize;
            let weight = weights.weight(n);
            StatsRow {
                number: n,
                weight,
                percent: weight * 100.0,
                freq: stats.freq[i],
                delay: stats.delay[i],
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.number.cmp(&b.number))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::DrawRecord;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn record(numbers: &[u32], stars: &[u32]) -> DrawRecord {
        DrawRecord {
            numbers: numbers.to_vec(),
            stars: stars.to_vec(),
        }
    }

    fn sample_history() -> DrawHistory {
        DrawHistory::new(vec![
            record(&[1, 2, 3], &[1]),
            record(&[1, 4, 5], &[2]),
            record(&[1, 2, 6], &[1]),
        ])
    }

    #[test]
    fn test_freq_and_delay() {
        let stats = build_stats(&sample_history(), NumberField::Main, 8);
        assert_eq!(stats.freq, vec![3, 2, 1, 1, 1, 1, 0, 0]);
        // 1 and 2 seen in the last draw, 7 and 8 never (= total draws)
        assert_eq!(stats.delay, vec![0, 0, 2, 1, 1, 0, 3, 3]);
        assert_eq!(stats.freq_norm[0], 1.0);
        assert_eq!(stats.freq_norm[7], 0.0);
        assert_eq!(stats.delay_norm[6], 1.0);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let history = DrawHistory::new(vec![record(&[0, 3, 99], &[])]);
        let stats = build_stats(&history, NumberField::Main, 5);
        assert_eq!(stats.freq, vec![0, 0, 1, 0, 0]);
    }

    #[test]
    fn test_zero_strength_is_uniform() {
        let stats = build_stats(&sample_history(), NumberField::Main, 10);
        let weights = NumberWeights::from_stats(&stats, 0.0);
        for n in 1..=10 {
            assert!((weights.weight(n) - 0.1).abs() < 1e-12);
        }
        assert_eq!(weights.weight(0), 0.0);
        assert_eq!(weights.weight(11), 0.0);
    }

    #[test]
    fn test_weight_floor() {
        // Absurd strength would drive cold numbers negative
        let stats = build_stats(&sample_history(), NumberField::Main, 10);
        let weights = NumberWeights::from_stats(&stats, 50.0);
        assert!(weights.as_slice().iter().all(|&w| w > 0.0));
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hot_numbers_weigh_more() {
        let stats = build_stats(&sample_history(), NumberField::Main, 6);
        let weights = NumberWeights::from_stats(&stats, DEFAULT_STAT_WEIGHT);
        // 1: top frequency, just seen -> hot 0.5; 4: rare, mid delay -> hot 0.25
        assert!(weights.weight(1) > weights.weight(4));
    }

    #[test]
    fn test_draw_distinct_ascending() {
        let mut rng = Pcg32::seed_from_u64(7);
        let weights = NumberWeights::uniform(12);
        let picked = draw_distinct_weighted(5, &weights, &mut rng);
        assert_eq!(picked.len(), 5);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        assert!(picked.iter().all(|n| (1..=12).contains(n)));
    }

    #[test]
    fn test_draw_more_than_available() {
        let mut rng = Pcg32::seed_from_u64(7);
        let weights = NumberWeights::uniform(3);
        assert_eq!(draw_distinct_weighted(10, &weights, &mut rng), vec![1, 2, 3]);
        assert!(draw_distinct_weighted(3, &NumberWeights::uniform(0), &mut rng).is_empty());
    }

    #[test]
    fn test_prepare_plan() {
        let mut rng = Pcg32::seed_from_u64(42);
        let config = DrawConfig::clamped(50, 5, 12, 2, 1.0);
        let plan = prepare_plan(&sample_history(), &config, 0.35, &mut rng).unwrap();
        assert_eq!(plan.main.len(), 5);
        assert_eq!(plan.second.len(), 2);
        assert_eq!(plan.planned(DrawPhase::Main, 4), Some(plan.main[4]));
        assert_eq!(plan.planned(DrawPhase::Second, 2), None);
        assert!(plan.sorted_main().windows(2).all(|w| w[0] < w[1]));

        assert!(prepare_plan(&DrawHistory::default(), &config, 0.35, &mut rng).is_none());
    }

    #[test]
    fn test_stats_table_sorted() {
        let rows = stats_table(&sample_history(), NumberField::Second, 4, 0.6);
        assert_eq!(rows.len(), 4);
        assert!(rows.windows(2).all(|w| w[0].weight >= w[1].weight));
        let total: f64 = rows.iter().map(|r| r.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_sampling_has_no_low_number_bias() {
        let weights = NumberWeights::uniform(50);
        let mut rng = Pcg32::seed_from_u64(2024);
        let trials = 4000;
        let hits = (0..trials)
            .filter(|_| sample_distinct_weighted(5, &weights, &mut rng).contains(&1))
            .count();
        let freq = hits as f64 / trials as f64;
        assert!((0.07..0.13).contains(&freq), "number 1 drawn with frequency {}", freq);
    }

    fn history_strategy() -> impl Strategy<Value = Vec<Vec<u32>>> {
        prop::collection::vec(prop::collection::vec(1u32..=30, 1..6), 1..25)
    }

    proptest! {
        #[test]
        fn prop_weights_sum_to_one(draws in history_strategy(), strength in 0.0f64..1.0) {
            let history = DrawHistory::new(draws.iter().map(|d| record(d, &[])).collect());
            let stats = build_stats(&history, NumberField::Main, 30);
            let weights = NumberWeights::from_stats(&stats, strength);
            prop_assert!((weights.sum() - 1.0).abs() < 1e-9);
            prop_assert!(weights.as_slice().iter().all(|&w| w > 0.0));
        }

        #[test]
        fn prop_weights_ignore_number_order(draws in history_strategy(), strength in 0.0f64..1.0) {
            let forward = DrawHistory::new(draws.iter().map(|d| record(d, &[])).collect());
            let reversed = DrawHistory::new(
                draws
                    .iter()
                    .map(|d| {
                        let mut d = d.clone();
                        d.reverse();
                        record(&d, &[])
                    })
                    .collect(),
            );
            let a =
                NumberWeights::from_stats(&build_stats(&forward, NumberField::Main, 30), strength);
            let b =
                NumberWeights::from_stats(&build_stats(&reversed, NumberField::Main, 30), strength);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_sampling_distinct(seed in any::<u64>(), amount in 0usize..20) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let picked = sample_distinct_weighted(amount, &NumberWeights::uniform(12), &mut rng);
            prop_assert_eq!(picked.len(), amount.min(12));
            let mut sorted = picked.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), picked.len());
        }
    }
}
