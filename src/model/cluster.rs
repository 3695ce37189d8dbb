//! # Posterior Cluster Merge
//!
//! Randomized search for the subset of reconstructed haplotypes that best
//! explains the whole list under a BIC-style posterior likelihood, followed
//! by a per-cluster consensus merge. Proposals mutate the best known subset
//! and are scored concurrently by a small worker pool; the coordinator owns
//! the randomness and the best-so-far state, workers only score.

use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

use rand::Rng;
use tracing::debug;

use crate::data::haplotype::Haplotype;
use crate::data::reference::Reference;
use crate::data::variant::{pattern_difference, pattern_distance, Event};
use crate::utils::stats;

/// Scoring seam for the subset search. Lower is better.
pub trait ClusterObjective: Sync {
    fn score(&self, subset: &[usize], haplotypes: &[Haplotype]) -> f64;
}

/// BIC-style objective. Each haplotype is attributed to its nearest
/// representative in the subset; the event differences are modeled as
/// Poisson-distributed sequencing errors with separate rates inside and
/// outside homopolymer runs, weighted by haplotype frequency. The model
/// size penalty is `k ln n`.
pub struct PoissonBicObjective<'a> {
    reference: &'a Reference,
    homopolymer_positions: u32,
    other_positions: u32,
    homopolymer_err: f64,
    other_err: f64,
}

impl<'a> PoissonBicObjective<'a> {
    pub fn new(
        reference: &'a Reference,
        span_start: f64,
        span_stop: f64,
        homopolymer_err: f64,
        other_err: f64,
    ) -> Self {
        let lo = (span_start - 1.0).max(0.0) as u32 + 1;
        let hi = (span_stop.max(0.0) as u32).min(reference.len() as u32);
        let homopolymer_positions = reference.homopolymer_positions(lo, hi);
        let total = if hi >= lo { hi - lo + 1 } else { 0 };
        Self {
            reference,
            homopolymer_positions,
            other_positions: total - homopolymer_positions,
            homopolymer_err,
            other_err,
        }
    }
}

impl ClusterObjective for PoissonBicObjective<'_> {
    fn score(&self, subset: &[usize], haplotypes: &[Haplotype]) -> f64 {
        if subset.is_empty() || haplotypes.is_empty() {
            return f64::INFINITY;
        }
        let lambda_homo = self.homopolymer_err * self.homopolymer_positions as f64;
        let lambda_other = self.other_err * self.other_positions as f64;
        let mut log_likelihood = 0.0;
        for hap in haplotypes {
            let nearest = nearest_in(subset, haplotypes, hap);
            let mut homo_diffs = 0u64;
            let mut other_diffs = 0u64;
            for event in pattern_difference(&hap.events, &nearest.events) {
                if self
                    .reference
                    .is_homopolymeric(event.pos.base_index(), event.is_indel())
                {
                    homo_diffs += 1;
                } else {
                    other_diffs += 1;
                }
            }
            let weight = hap.frequency / 100.0;
            log_likelihood += weight
                * (stats::poisson_ln_pmf(lambda_homo, homo_diffs)
                    + stats::poisson_ln_pmf(lambda_other, other_diffs));
        }
        subset.len() as f64 * (haplotypes.len() as f64).ln() - 2.0 * log_likelihood
    }
}

/// Nearest representative by pattern distance. Ties go to the earliest
/// subset entry.
fn nearest_in<'h>(subset: &[usize], haplotypes: &'h [Haplotype], hap: &Haplotype) -> &'h Haplotype {
    let mut nearest = &haplotypes[subset[0]];
    let mut nearest_distance = pattern_distance(&hap.events, &nearest.events);
    for &idx in &subset[1..] {
        let candidate = &haplotypes[idx];
        let d = pattern_distance(&hap.events, &candidate.events);
        if d < nearest_distance {
            nearest = candidate;
            nearest_distance = d;
        }
    }
    nearest
}

/// Initial subset size: 15% of the haplotype count, at least one.
fn seed_size(count: usize) -> usize {
    ((count as f64 * 0.15).floor() as usize).max(1)
}

/// Mutate the best known subset: grow by a random outside index, shrink by
/// a random member, or swap a member for an outside index, each a third of
/// the time. Degenerate moves fall through unchanged.
fn propose_subset<R: Rng + ?Sized>(best: &[usize], count: usize, rng: &mut R) -> Vec<usize> {
    let mut subset = best.to_vec();
    let missing: Vec<usize> = (0..count).filter(|i| !subset.contains(i)).collect();
    match rng.gen_range(0..3u8) {
        0 => {
            if !missing.is_empty() {
                subset.push(missing[rng.gen_range(0..missing.len())]);
            }
        }
        1 => {
            if subset.len() > 1 {
                subset.remove(rng.gen_range(0..subset.len()));
            }
        }
        _ => {
            if !missing.is_empty() && !subset.is_empty() {
                let slot = rng.gen_range(0..subset.len());
                subset[slot] = missing[rng.gen_range(0..missing.len())];
            }
        }
    }
    subset.sort_unstable();
    subset
}

/// Run the randomized subset search and return the best subset found,
/// sorted ascending. The coordinator dispatches one proposal per free
/// worker, folds results in completion order, and reproposes from the best
/// subset known at that moment.
pub fn search_clusters<O, R>(
    haplotypes: &[Haplotype],
    objective: &O,
    trials: usize,
    workers: usize,
    rng: &mut R,
) -> Vec<usize>
where
    O: ClusterObjective,
    R: Rng + ?Sized,
{
    let count = haplotypes.len();
    let mut best: Vec<usize> = (0..seed_size(count)).collect();
    let mut best_score = objective.score(&best, haplotypes);
    if trials == 0 || count < 2 {
        return best;
    }
    let workers = workers.max(1).min(trials);

    thread::scope(|scope| {
        let (result_tx, result_rx) = mpsc::channel::<(usize, Vec<usize>, f64)>();
        let mut job_senders: Vec<Option<mpsc::Sender<Vec<usize>>>> = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let (job_tx, job_rx) = mpsc::channel::<Vec<usize>>();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok(subset) = job_rx.recv() {
                    let score = objective.score(&subset, haplotypes);
                    if result_tx.send((worker_id, subset, score)).is_err() {
                        break;
                    }
                }
            });
            job_senders.push(Some(job_tx));
        }
        drop(result_tx);

        let mut dispatched = 0;
        for sender in job_senders.iter().flatten() {
            if dispatched == trials {
                break;
            }
            if sender.send(propose_subset(&best, count, rng)).is_ok() {
                dispatched += 1;
            }
        }
        let mut completed = 0;
        while completed < dispatched {
            let Ok((worker_id, subset, score)) = result_rx.recv() else {
                break;
            };
            completed += 1;
            if score < best_score {
                best_score = score;
                best = subset;
            }
            if dispatched < trials {
                if let Some(sender) = &job_senders[worker_id] {
                    if sender.send(propose_subset(&best, count, rng)).is_ok() {
                        dispatched += 1;
                    }
                }
            } else {
                job_senders[worker_id] = None;
            }
        }
        job_senders.clear();
    });

    debug!(
        trials,
        clusters = best.len(),
        score = best_score,
        "cluster search done"
    );
    best
}

/// Collapse the haplotype list onto the chosen representatives. Every
/// haplotype joins its nearest representative's cluster (ties to the
/// earliest); each cluster emits one consensus haplotype carrying the
/// events present in a strict majority of its members and the summed
/// frequency. Representatives left with no members emit nothing.
pub fn consensus_merge(
    haplotypes: &[Haplotype],
    subset: &[usize],
    reference: &Reference,
    span_start: f64,
    span_stop: f64,
) -> Vec<Haplotype> {
    let representatives: Vec<&Haplotype> = subset.iter().map(|&i| &haplotypes[i]).collect();
    if representatives.is_empty() {
        return Vec::new();
    }
    let mut groups: Vec<Vec<&Haplotype>> = vec![Vec::new(); representatives.len()];
    for hap in haplotypes {
        let mut slot = 0;
        let mut best_distance = pattern_distance(&hap.events, &representatives[0].events);
        for (i, rep) in representatives.iter().enumerate().skip(1) {
            let d = pattern_distance(&hap.events, &rep.events);
            if d < best_distance {
                slot = i;
                best_distance = d;
            }
        }
        groups[slot].push(hap);
    }
    let mut merged = Vec::new();
    for group in groups {
        if group.is_empty() {
            continue;
        }
        let mut votes: HashMap<Event, usize> = HashMap::new();
        let mut frequency = 0.0;
        for hap in &group {
            frequency += hap.frequency;
            for event in &hap.events {
                *votes.entry(*event).or_insert(0) += 1;
            }
        }
        let majority = group.len() as f64 / 2.0;
        let events: Vec<Event> = votes
            .into_iter()
            .filter(|&(_, count)| count as f64 > majority)
            .map(|(event, _)| event)
            .collect();
        let mut hap = Haplotype::new(events, frequency);
        hap.derive_sequence(reference, span_start, span_stop);
        merged.push(hap);
    }
    merged
}
