//! # Window Partitions
//!
//! An ordered chain of overlapping reference windows, the ten descriptive
//! statistics scored against a read population, and the randomized generator
//! that proposes candidate partitions.
//!
//! Two structural predicates gate every candidate: consecutive windows must
//! overlap in strictly increasing order, and no window may overlap anything
//! other than its immediate neighbors. Candidates passing both with a
//! minimum spanning coverage above one enter the ranking ensemble.

use rand::Rng;

use crate::data::read::ReadPopulation;
use crate::utils::stats;

/// Read-pair count beyond which overlap diversity switches from exhaustive
/// enumeration to random sampling of the same number of pairs.
const DIVERSITY_SAMPLING_LIMIT: usize = 3_333;

/// Probability floor applied before taking logs during ranking.
const PROB_FLOOR: f64 = 1e-100;

/// Composite score assigned when a candidate's log-sum is non-finite.
pub const SCORE_FLOOR: f64 = -1e100;

/// Shortest window any generator will propose.
pub(crate) const MIN_WINDOW_LENGTH: f64 = 50.0;

/// Index of the one ranked statistic where smaller is better (window count).
const REVERSED_STAT: usize = 5;

/// One reference window with real-valued bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window {
    pub start: f64,
    pub stop: f64,
}

impl Window {
    pub fn new(start: f64, stop: f64) -> Self {
        Self { start, stop }
    }

    pub fn length(&self) -> f64 {
        self.stop - self.start
    }
}

/// The ten descriptive statistics of a partition against a population.
#[derive(Clone, Copy, Debug, Default)]
pub struct PartitionStats {
    pub min_coverage: f64,
    pub mean_coverage: f64,
    pub min_overlap_diversity: f64,
    pub mean_overlap_diversity: f64,
    pub nonzero_diversity_fraction: f64,
    pub window_count: f64,
    pub min_overlap_length: f64,
    pub mean_overlap_length: f64,
    pub min_window_length: f64,
    pub mean_window_length: f64,
}

impl PartitionStats {
    /// The statistics in ranking order. Index 5 (window count) is the only
    /// one ranked in reverse.
    pub fn as_array(&self) -> [f64; 10] {
        [
            self.min_coverage,
            self.mean_coverage,
            self.min_overlap_diversity,
            self.mean_overlap_diversity,
            self.nonzero_diversity_fraction,
            self.window_count,
            self.min_overlap_length,
            self.mean_overlap_length,
            self.min_window_length,
            self.mean_window_length,
        ]
    }
}

/// Per-statistic empirical rank probabilities and the composite log score.
#[derive(Clone, Copy, Debug)]
pub struct PartitionPosterior {
    pub probs: [f64; 10],
    pub score: f64,
}

/// Column vectors of the ten statistics across a candidate ensemble.
pub struct StatEnsemble {
    columns: [Vec<f64>; 10],
}

impl StatEnsemble {
    pub fn collect<'a>(candidates: impl Iterator<Item = &'a WindowPartition>) -> Self {
        let mut columns: [Vec<f64>; 10] = Default::default();
        for candidate in candidates {
            for (column, value) in columns.iter_mut().zip(candidate.stats.as_array()) {
                column.push(value);
            }
        }
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns[0].is_empty()
    }
}

/// An ordered sequence of overlapping reference windows.
#[derive(Clone, Debug)]
pub struct WindowPartition {
    windows: Vec<Window>,
    stats: PartitionStats,
    posterior: Option<PartitionPosterior>,
}

impl WindowPartition {
    /// Build a partition and compute its statistics against the population.
    /// `rng` drives the sampled overlap-diversity estimate when the pair
    /// pool is large.
    pub fn new<R: Rng + ?Sized>(
        windows: Vec<Window>,
        population: &ReadPopulation,
        rng: &mut R,
    ) -> Self {
        let stats = compute_stats(&windows, population, rng);
        Self {
            windows,
            stats,
            posterior: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_stats(windows: Vec<Window>, stats: PartitionStats) -> Self {
        Self {
            windows,
            stats,
            posterior: None,
        }
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn stats(&self) -> &PartitionStats {
        &self.stats
    }

    pub fn posterior(&self) -> Option<&PartitionPosterior> {
        self.posterior.as_ref()
    }

    /// Composite score; candidates that were never ranked sit at the floor.
    pub fn score(&self) -> f64 {
        self.posterior.map_or(SCORE_FLOOR, |p| p.score)
    }

    pub fn is_better_than(&self, other: &WindowPartition) -> bool {
        self.score() > other.score()
    }

    /// Consecutive windows strictly ordered on both bounds and overlapping.
    pub fn is_consistent(&self) -> bool {
        if self.windows.is_empty() {
            return false;
        }
        if self.windows.iter().any(|w| !(w.start < w.stop)) {
            return false;
        }
        self.windows.windows(2).all(|pair| {
            pair[0].start < pair[1].start
                && pair[0].stop < pair[1].stop
                && pair[1].start < pair[0].stop
        })
    }

    /// Windows overlap only their immediate neighbors: every non-adjacent
    /// pair is disjoint. Two windows use a simplified comparison without the
    /// per-window bound check.
    pub fn overlaps_only_adjacent(&self) -> bool {
        match self.windows.len() {
            0 => false,
            1 => true,
            2 => {
                let (a, b) = (self.windows[0], self.windows[1]);
                b.start < a.stop && a.start < b.start && a.stop < b.stop
            }
            _ => self.windows.windows(3).all(|t| {
                let (a, b, c) = (t[0], t[1], t[2]);
                a.stop < c.start
                    && a.start < b.start
                    && b.start < c.start
                    && a.stop < b.stop
                    && b.stop < c.stop
                    && b.start < a.stop
                    && c.start < b.stop
            }),
        }
    }

    /// Both structural predicates.
    pub fn is_structurally_valid(&self) -> bool {
        self.is_consistent() && self.overlaps_only_adjacent()
    }

    /// Empirical one-sided rank of each statistic within the ensemble and
    /// the composite log score. For every statistic except window count the
    /// probability is the fraction of the ensemble at or below the
    /// candidate's value; window count uses at-or-above. Zero probabilities
    /// are floored before the log so a single bad statistic stays finite.
    pub fn rank_against(&mut self, ensemble: &StatEnsemble) {
        let own = self.stats.as_array();
        let n = ensemble.len();
        let mut probs = [0.0f64; 10];
        for (k, prob) in probs.iter_mut().enumerate() {
            if n == 0 {
                continue;
            }
            let hits = ensemble.columns[k]
                .iter()
                .filter(|&&v| {
                    if k == REVERSED_STAT {
                        v >= own[k]
                    } else {
                        v <= own[k]
                    }
                })
                .count();
            *prob = hits as f64 / n as f64;
        }
        let mut score: f64 = probs.iter().map(|p| p.max(PROB_FLOOR).ln()).sum();
        if !score.is_finite() {
            score = SCORE_FLOOR;
        }
        self.posterior = Some(PartitionPosterior { probs, score });
    }
}

fn compute_stats<R: Rng + ?Sized>(
    windows: &[Window],
    population: &ReadPopulation,
    rng: &mut R,
) -> PartitionStats {
    let n = windows.len();
    if n == 0 {
        return PartitionStats::default();
    }

    let spanning: Vec<Vec<usize>> = windows
        .iter()
        .map(|w| population.spanning(w.start, w.stop))
        .collect();
    let coverages: Vec<f64> = spanning.iter().map(|s| s.len() as f64).collect();
    let min_coverage = coverages.iter().copied().fold(f64::INFINITY, f64::min);

    let mut diversities = Vec::with_capacity(n.saturating_sub(1));
    let mut nonzero = 0usize;
    for j in 1..n {
        let overlap_start = windows[j].start;
        let overlap_stop = windows[j - 1].stop;
        let d = if min_coverage > 0.0 {
            overlap_diversity(
                population,
                &spanning[j - 1],
                &spanning[j],
                overlap_start,
                overlap_stop,
                rng,
            )
        } else {
            0.0
        };
        if d > 0.0 {
            nonzero += 1;
        }
        diversities.push(d);
    }

    let overlap_lengths: Vec<f64> = (1..n)
        .map(|j| windows[j - 1].stop - windows[j].start)
        .collect();
    let window_lengths: Vec<f64> = windows.iter().map(Window::length).collect();

    PartitionStats {
        min_coverage,
        mean_coverage: stats::mean(&coverages),
        min_overlap_diversity: diversities.iter().copied().reduce(f64::min).unwrap_or(0.0),
        mean_overlap_diversity: stats::mean(&diversities),
        nonzero_diversity_fraction: nonzero as f64 / n as f64,
        window_count: n as f64,
        min_overlap_length: overlap_lengths
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0),
        mean_overlap_length: stats::mean(&overlap_lengths),
        min_window_length: window_lengths
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0),
        mean_window_length: stats::mean(&window_lengths),
    }
}

/// Mean pairwise read distance per overlap base, over reads spanning either
/// of the two adjacent windows. Exhaustive below the pair limit, sampled at
/// the limit above it.
fn overlap_diversity<R: Rng + ?Sized>(
    population: &ReadPopulation,
    left: &[usize],
    right: &[usize],
    start: f64,
    stop: f64,
    rng: &mut R,
) -> f64 {
    let length = stop - start;
    if length <= 0.0 {
        return 0.0;
    }
    let mut pool: Vec<usize> = left.iter().chain(right).copied().collect();
    pool.sort_unstable();
    pool.dedup();
    let m = pool.len();
    if m < 2 {
        return 0.0;
    }
    let reads = population.reads();
    let pairs = m * (m - 1) / 2;
    let mut total = 0.0;
    let mut count = 0usize;
    if pairs < DIVERSITY_SAMPLING_LIMIT {
        for a in 0..m {
            for b in (a + 1)..m {
                total += reads[pool[a]].distance_in(&reads[pool[b]], start, stop) as f64 / length;
                count += 1;
            }
        }
    } else {
        while count < DIVERSITY_SAMPLING_LIMIT {
            let a = rng.gen_range(0..m);
            let b = rng.gen_range(0..m);
            if a == b {
                continue;
            }
            total += reads[pool[a]].distance_in(&reads[pool[b]], start, stop) as f64 / length;
            count += 1;
        }
    }
    total / count as f64
}

/// Slide fixed-size windows across the span. The first window is stretched
/// by one step; the last stop is clamped to the span end.
pub(crate) fn tile_windows(span_start: f64, span_stop: f64, window: f64, step: f64) -> Vec<Window> {
    let mut prev = Window::new(span_start, span_start + window + step);
    let mut windows = vec![prev];
    while prev.stop < span_stop {
        let mut next = Window::new(prev.start + step, prev.stop + step);
        if next.stop > span_stop {
            next.stop = span_stop;
        }
        windows.push(next);
        prev = next;
    }
    windows
}

/// Randomized partition proposals: 90% chain growth from the span start,
/// 10% uniform sliding tilings.
pub struct RandomPartitionGenerator {
    span_start: f64,
    span_stop: f64,
    mean_len: f64,
    std_len: f64,
}

impl RandomPartitionGenerator {
    pub fn new(population: &ReadPopulation) -> Self {
        Self {
            span_start: population.span_start(),
            span_stop: population.span_stop(),
            mean_len: population.mean_read_length(),
            std_len: population.read_length_std(),
        }
    }

    /// One raw draw. Callers filter for validity.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        population: &ReadPopulation,
        rng: &mut R,
    ) -> WindowPartition {
        let windows = if rng.gen::<f64>() < 0.9 {
            self.chain_growth(rng)
        } else {
            self.uniform_tiling(rng)
        };
        WindowPartition::new(windows, population, rng)
    }

    /// Redraw until a candidate passes both structural checks with minimum
    /// coverage above one, giving up after 50 attempts and returning the
    /// last draw regardless. Downstream filtering catches the stragglers.
    pub fn generate_checked<R: Rng + ?Sized>(
        &self,
        population: &ReadPopulation,
        rng: &mut R,
    ) -> WindowPartition {
        let mut candidate = self.generate(population, rng);
        let mut attempts = 0;
        while attempts < 50
            && !(candidate.is_structurally_valid() && candidate.stats().min_coverage > 1.0)
        {
            candidate = self.generate(population, rng);
            attempts += 1;
        }
        candidate
    }

    /// First window length: normal around two thirds of the mean read
    /// length, occasionally uniform, floored at the minimum window length.
    fn first_length<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let mut len = stats::sample_normal(rng, self.mean_len / 1.5, self.mean_len.sqrt());
        if rng.gen::<f64>() < 0.1 {
            len = rng.gen::<f64>() * self.mean_len;
        }
        if len < MIN_WINDOW_LENGTH {
            len = MIN_WINDOW_LENGTH.max(rng.gen::<f64>() * self.mean_len);
        }
        len
    }

    /// Subsequent window lengths. Tight read-length distributions get a
    /// fixed spread so the proposals still vary.
    fn next_length<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let mut len = if self.std_len < 5.0 {
            if rng.gen::<f64>() < 0.1 {
                stats::sample_normal(rng, self.mean_len / 2.0, self.mean_len.sqrt())
            } else {
                stats::sample_normal(rng, self.mean_len - 15.0, 5.0)
            }
        } else {
            stats::sample_normal(rng, self.mean_len - 3.0 * self.std_len, self.std_len)
        };
        if rng.gen::<f64>() < 0.1 {
            len = rng.gen::<f64>() * self.mean_len;
        }
        if len < MIN_WINDOW_LENGTH {
            len = MIN_WINDOW_LENGTH.max(rng.gen::<f64>() * self.mean_len);
        }
        len
    }

    /// Grow windows left to right. Each new window starts inside the
    /// previous one and must advance the chain; the final window lands
    /// exactly on the span stop.
    fn chain_growth<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Window> {
        let mut prev = Window::new(self.span_start, self.span_start + self.first_length(rng));
        let mut windows = vec![prev];
        while prev.stop != self.span_stop {
            let len = self.next_length(rng);
            let min_start = prev.start.max(prev.stop - len + 1.0);
            let start = min_start + rng.gen::<f64>() * (prev.stop - min_start);
            let stop = (prev.stop + 1.0).max(start + len).min(self.span_stop);
            prev = Window::new(start, stop);
            windows.push(prev);
        }
        windows
    }

    /// Uniform tiling with a random window size and step.
    fn uniform_tiling<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Window> {
        let mut window = self.next_length(rng);
        if self.span_start + window > self.span_stop {
            window = (self.span_stop - self.span_start) / 3.0;
        }
        let step = (window * rng.gen::<f64>()).max(5.0);
        tile_windows(self.span_start, self.span_stop, window, step)
    }
}
