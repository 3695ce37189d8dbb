//! # Partition Search
//!
//! Two-phase search for the working window partition. A deterministic sweep
//! tiles the region with a fixed grid of window sizes and step fractions,
//! then a randomized phase draws partition proposals in parallel. Survivors
//! are ranked by empirical posterior probability against the whole candidate
//! ensemble and the working partition is chosen from the credible set.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::data::read::ReadPopulation;
use crate::error::{QuasihapError, Result};
use crate::model::partition::{
    tile_windows, RandomPartitionGenerator, StatEnsemble, WindowPartition, MIN_WINDOW_LENGTH,
};

/// Step fractions for the deterministic sweep, as fractions of the window
/// size. Odd twentieths from 1/20 through 17/20.
const STEP_FRACTIONS: [f64; 9] = [
    1.0 / 20.0,
    3.0 / 20.0,
    5.0 / 20.0,
    7.0 / 20.0,
    9.0 / 20.0,
    11.0 / 20.0,
    13.0 / 20.0,
    15.0 / 20.0,
    17.0 / 20.0,
];

/// Cumulative posterior mass retained as the credible set.
const CREDIBLE_MASS: f64 = 0.9;

/// Minimum per-statistic posterior probability for a candidate to be picked
/// ahead of the top-scoring one.
const SELECTION_THRESHOLD: f64 = 0.5;

/// Ranked candidate partitions, best score first.
#[derive(Debug)]
pub struct RankedPartitions {
    candidates: Vec<WindowPartition>,
    credible_len: usize,
    selected: usize,
}

impl RankedPartitions {
    pub fn selected(&self) -> &WindowPartition {
        &self.candidates[self.selected]
    }

    pub fn into_selected(mut self) -> WindowPartition {
        self.candidates.swap_remove(self.selected)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn credible_len(&self) -> usize {
        self.credible_len
    }
}

pub struct PartitionSearch {
    iterations: usize,
    seed: u64,
}

impl PartitionSearch {
    pub fn new(iterations: usize, seed: u64) -> Self {
        Self { iterations, seed }
    }

    /// Run both phases and rank the pooled candidates.
    pub fn run(&self, population: &ReadPopulation) -> Result<RankedPartitions> {
        let mut candidates = self.sweep_candidates(population);
        debug!(candidates = candidates.len(), "deterministic sweep done");
        candidates.extend(self.random_candidates(population));
        debug!(candidates = candidates.len(), "randomized proposals done");
        Self::rank(candidates).ok_or_else(|| {
            QuasihapError::search("no structurally valid window partition with coverage > 1")
        })
    }

    /// Deterministic phase: one sliding-window tiling per grid cell, kept
    /// only when it passes both structural checks with coverage above one.
    fn sweep_candidates(&self, population: &ReadPopulation) -> Vec<WindowPartition> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let sizes = window_sizes(
            population.mean_read_length(),
            population.read_length_std(),
            &mut rng,
        );
        let span_start = population.span_start();
        let span_stop = population.span_stop();
        let mut candidates = Vec::new();
        for &fraction in STEP_FRACTIONS.iter() {
            for &size in sizes.iter() {
                let mut window = size;
                if span_start + window > span_stop {
                    window = (span_stop - span_start) / 3.0;
                }
                let step = window * fraction - 1.0;
                if step <= 0.0 {
                    continue;
                }
                let windows = tile_windows(span_start, span_stop, window, step);
                let candidate = WindowPartition::new(windows, population, &mut rng);
                if candidate.is_structurally_valid() && candidate.stats().min_coverage > 1.0 {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }

    /// Randomized phase. Each trial reseeds from the trial index so the
    /// candidate list is reproducible whatever the thread schedule.
    fn random_candidates(&self, population: &ReadPopulation) -> Vec<WindowPartition> {
        let generator = RandomPartitionGenerator::new(population);
        (0..self.iterations)
            .into_par_iter()
            .map(|trial| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(trial as u64 + 1));
                generator.generate_checked(population, &mut rng)
            })
            .collect()
    }

    /// Filter, score against the pooled ensemble, sort best first, cut the
    /// credible set at cumulative mass 0.9, and select the first credible
    /// candidate whose every statistic ranks at least even. When none does,
    /// the top-scoring candidate stands.
    fn rank(candidates: Vec<WindowPartition>) -> Option<RankedPartitions> {
        let mut candidates: Vec<WindowPartition> = candidates
            .into_iter()
            .filter(|c| c.is_structurally_valid() && c.stats().min_coverage > 1.0)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let ensemble = StatEnsemble::collect(candidates.iter());
        for candidate in candidates.iter_mut() {
            candidate.rank_against(&ensemble);
        }
        candidates.sort_by(|a, b| b.score().total_cmp(&a.score()));

        let weights: Vec<f64> = candidates.iter().map(|c| c.score().exp()).collect();
        let total: f64 = weights.iter().sum();
        let mut credible_len = candidates.len();
        if total > 0.0 {
            let mut cumulative = 0.0;
            for (i, weight) in weights.iter().enumerate() {
                cumulative += weight / total;
                if cumulative >= CREDIBLE_MASS {
                    credible_len = i + 1;
                    break;
                }
            }
        }
        let selected = candidates[..credible_len]
            .iter()
            .position(|c| {
                c.posterior()
                    .map_or(false, |p| p.probs.iter().all(|&prob| prob >= SELECTION_THRESHOLD))
            })
            .unwrap_or(0);
        Some(RankedPartitions {
            candidates,
            credible_len,
            selected,
        })
    }
}

/// The sweep's window-size schedule. Sizes walk down from one read-length
/// standard deviation above the mean to a sixth of the mean; tight length
/// distributions swap the leading entries for fixed offsets below the mean.
/// Anything under the minimum window length is redrawn uniformly.
fn window_sizes<R: Rng + ?Sized>(mean: f64, std: f64, rng: &mut R) -> [f64; 14] {
    let mut sizes = [
        mean + std,
        mean,
        mean - std,
        mean - 2.0 * std,
        mean - 3.0 * std,
        mean * 5.0 / 6.0,
        mean * 4.0 / 5.0,
        mean * 3.0 / 4.0,
        mean * 2.0 / 3.0,
        mean / 2.0,
        mean / 3.0,
        mean / 4.0,
        mean / 5.0,
        mean / 6.0,
    ];
    if std < 5.0 {
        for (i, size) in sizes.iter_mut().take(4).enumerate() {
            *size = mean - 5.0 * (i as f64 + 1.0);
        }
    }
    for size in sizes.iter_mut() {
        if *size < MIN_WINDOW_LENGTH {
            *size = MIN_WINDOW_LENGTH.max(rng.gen::<f64>() * mean / 2.0);
        }
    }
    sizes
}
