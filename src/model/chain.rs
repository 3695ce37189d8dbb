//! # Catalog Chains
//!
//! The ordered chain of per-window catalogs and the iterative extraction of
//! full-length haplotypes from it. Each pass prunes unsupported patterns,
//! anchors a guide window, searches for a cross-window index assignment in
//! which every adjacent pair of patterns agrees on its overlap key, then
//! peels the assignment off by its minimum frequency. Extraction repeats
//! until some window's catalog empties out.

use rand::Rng;
use tracing::debug;

use crate::data::haplotype::Haplotype;
use crate::data::read::ReadPopulation;
use crate::data::reference::Reference;
use crate::error::Result;
use crate::model::catalog::{CatalogBounds, VariantCatalog};
use crate::model::partition::Window;
use crate::utils::stats;

pub struct CatalogChain {
    catalogs: Vec<VariantCatalog>,
    span_start: f64,
    span_stop: f64,
}

/// Everything the extraction produced, plus the span and window count of the
/// chain that finally yielded it (the shrink fallback can rebuild on a
/// narrower partition than the one it started from).
pub struct ChainExtraction {
    pub haplotypes: Vec<Haplotype>,
    pub span_start: f64,
    pub span_stop: f64,
    pub windows_used: usize,
}

impl CatalogChain {
    /// One catalog per window. Interior windows take their overlap bounds
    /// from the neighboring windows; the first and last windows close their
    /// outer boundary on themselves.
    pub fn build(population: &ReadPopulation, windows: &[Window]) -> Self {
        let n = windows.len();
        let catalogs = (0..n)
            .map(|i| {
                let bounds = CatalogBounds {
                    start: windows[i].start,
                    mid_prev: if i == 0 {
                        windows[0].start
                    } else {
                        windows[i - 1].stop
                    },
                    mid_next: if i + 1 == n {
                        windows[n - 1].stop
                    } else {
                        windows[i + 1].start
                    },
                    stop: windows[i].stop,
                };
                VariantCatalog::build(population, bounds)
            })
            .collect();
        Self {
            catalogs,
            span_start: windows.first().map_or(0.0, |w| w.start),
            span_stop: windows.last().map_or(0.0, |w| w.stop),
        }
    }

    pub fn catalogs(&self) -> &[VariantCatalog] {
        &self.catalogs
    }

    pub fn span_start(&self) -> f64 {
        self.span_start
    }

    pub fn span_stop(&self) -> f64 {
        self.span_stop
    }

    pub fn min_catalog_len(&self) -> usize {
        self.catalogs
            .iter()
            .map(VariantCatalog::len)
            .min()
            .unwrap_or(0)
    }

    /// Forward prune: zero patterns without an overlap partner in the next
    /// window, then purge depleted entries everywhere.
    fn prune_unsupported(&mut self) {
        for i in 0..self.catalogs.len().saturating_sub(1) {
            let (head, tail) = self.catalogs.split_at_mut(i + 1);
            head[i].zero_unsupported(&tail[0]);
        }
        for catalog in &mut self.catalogs {
            catalog.remove_depleted();
        }
    }

    /// Guide window: the catalog whose frequency profile is most typical of
    /// the chain, measured by the summed log chi-squared tail of its profile
    /// against every other catalog's (zero-padded to its own length).
    /// Falls back to a random window when no score beats negative infinity.
    fn guide_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let n = self.catalogs.len();
        let mut best = rng.gen_range(0..n);
        let mut best_score = f64::NEG_INFINITY;
        for i in 0..n {
            let profile: Vec<f64> = self.catalogs[i]
                .patterns()
                .iter()
                .map(|p| p.frequency)
                .collect();
            let df = profile.len() as f64 - 1.0;
            let mut total = 0.0;
            for j in 0..n {
                let other = self.catalogs[j].patterns();
                let mut x = 0.0;
                for (k, &f) in profile.iter().enumerate() {
                    let g = other.get(k).map_or(0.0, |p| p.frequency);
                    x += (f - g) * (f - g) / f;
                }
                total += stats::chi_squared_tail(x, df).ln();
            }
            if total > best_score {
                best_score = total;
                best = i;
            }
        }
        best
    }

    /// Find an index vector in which every adjacent pattern pair agrees on
    /// its overlap key, by mixed-radix repair from the all-zeros vector.
    /// `None` when the space is exhausted.
    fn find_assignment(&self, guide: usize) -> Option<Vec<usize>> {
        let n = self.catalogs.len();
        let sizes: Vec<usize> = self.catalogs.iter().map(VariantCatalog::len).collect();
        if sizes.iter().any(|&s| s == 0) {
            return None;
        }
        let mut idx = vec![0usize; n];
        loop {
            let fwd = self.forward_mismatch(guide, &idx);
            let rwd = self.backward_mismatch(guide, &idx);
            if fwd.is_none() && rwd.is_none() {
                return Some(idx);
            }
            // Repair one mismatch per pass, forward first, then rescan.
            if let Some(m) = fwd {
                if !repair_forward(&mut idx, &sizes, guide, m) {
                    return None;
                }
                continue;
            }
            if let Some(m) = rwd {
                if !repair_backward(&mut idx, &sizes, guide, m) {
                    return None;
                }
            }
        }
    }

    /// First boundary at or right of the guide whose patterns disagree.
    /// Reports the far (right) side of the failing boundary.
    fn forward_mismatch(&self, guide: usize, idx: &[usize]) -> Option<usize> {
        for i in guide..self.catalogs.len().saturating_sub(1) {
            let p = self.catalogs[i].pattern(idx[i]);
            let q = self.catalogs[i + 1].pattern(idx[i + 1]);
            if !p.overlaps(q) {
                return Some(i + 1);
            }
        }
        None
    }

    /// First boundary at or left of the guide whose patterns disagree,
    /// scanning outward from the guide. Reports the far (left) side.
    fn backward_mismatch(&self, guide: usize, idx: &[usize]) -> Option<usize> {
        for i in (1..=guide.min(self.catalogs.len().saturating_sub(1))).rev() {
            let p = self.catalogs[i - 1].pattern(idx[i - 1]);
            let q = self.catalogs[i].pattern(idx[i]);
            if !p.overlaps(q) {
                return Some(i - 1);
            }
        }
        None
    }

    /// Assemble the haplotype at `indices`, subtract its frequency from
    /// every selected pattern, purge and re-sort the catalogs.
    fn take_haplotype(&mut self, indices: &[usize], reference: &Reference) -> Haplotype {
        let n = self.catalogs.len();
        let mut events = Vec::new();
        let mut freq = f64::INFINITY;
        for (i, (&idx, catalog)) in indices.iter().zip(&self.catalogs).enumerate() {
            let pattern = catalog.pattern(idx);
            events.extend_from_slice(&pattern.left);
            events.extend_from_slice(&pattern.core);
            if i + 1 == n {
                events.extend_from_slice(&pattern.right);
            }
            freq = freq.min(pattern.frequency);
        }
        for (i, &idx) in indices.iter().enumerate() {
            self.catalogs[i].subtract_at(idx, freq);
        }
        for catalog in &mut self.catalogs {
            catalog.remove_depleted();
            catalog.sort_by_frequency();
        }
        let mut haplotype = Haplotype::new(events, freq);
        haplotype.derive_sequence(reference, self.span_start, self.span_stop);
        haplotype
    }

    /// Extract haplotypes until a catalog empties or no assignment exists.
    /// `rng` seeds the guide fallback anchor.
    pub fn extract_all<R: Rng + ?Sized>(
        &mut self,
        reference: &Reference,
        rng: &mut R,
    ) -> Vec<Haplotype> {
        let mut out = Vec::new();
        loop {
            self.prune_unsupported();
            if self.min_catalog_len() == 0 {
                break;
            }
            for catalog in &mut self.catalogs {
                catalog.sort_by_frequency();
            }
            let guide = self.guide_index(rng);
            let Some(indices) = self.find_assignment(guide) else {
                break;
            };
            out.push(self.take_haplotype(&indices, reference));
        }
        debug!(haplotypes = out.len(), "chain extraction finished");
        out
    }
}

/// Mixed-radix increment at the mismatch position, carrying toward the
/// guide. Returns false when the carry exhausts the guide's own options.
/// Positions less significant than the settled digit are reset; settling on
/// the guide itself resets both sides.
fn repair_forward(idx: &mut [usize], sizes: &[usize], guide: usize, mismatch: usize) -> bool {
    let mut m = mismatch;
    idx[m] += 1;
    while idx[m] >= sizes[m] && m > guide {
        idx[m] = 0;
        m -= 1;
        idx[m] += 1;
    }
    if idx[m] >= sizes[m] {
        return false;
    }
    for j in (m + 1)..idx.len() {
        idx[j] = 0;
    }
    if m == guide {
        for j in 0..guide {
            idx[j] = 0;
        }
    }
    true
}

fn repair_backward(idx: &mut [usize], sizes: &[usize], guide: usize, mismatch: usize) -> bool {
    let mut m = mismatch;
    idx[m] += 1;
    while idx[m] >= sizes[m] && m < guide {
        idx[m] = 0;
        m += 1;
        idx[m] += 1;
    }
    if idx[m] >= sizes[m] {
        return false;
    }
    for j in 0..m {
        idx[j] = 0;
    }
    if m == guide {
        for j in (guide + 1)..idx.len() {
            idx[j] = 0;
        }
    }
    true
}

/// Extraction with the shrink fallback: when a chain yields nothing and more
/// than one window remains, drop the first or last window at random and
/// rebuild. `on_chain` sees every chain before its extraction runs, so the
/// published overlap table always describes the chain that was extracted.
pub fn extract_with_shrink<R: Rng + ?Sized>(
    population: &ReadPopulation,
    windows: &[Window],
    reference: &Reference,
    rng: &mut R,
    mut on_chain: impl FnMut(&CatalogChain) -> Result<()>,
) -> Result<ChainExtraction> {
    let mut windows = windows.to_vec();
    loop {
        let mut chain = CatalogChain::build(population, &windows);
        on_chain(&chain)?;
        let haplotypes = chain.extract_all(reference, rng);
        if !haplotypes.is_empty() || windows.len() <= 1 {
            return Ok(ChainExtraction {
                haplotypes,
                span_start: chain.span_start(),
                span_stop: chain.span_stop(),
                windows_used: windows.len(),
            });
        }
        if rng.gen::<f64>() < 0.5 {
            windows.remove(0);
        } else {
            windows.pop();
        }
        debug!(
            windows = windows.len(),
            "no haplotypes extracted, retrying on a narrower partition"
        );
    }
}
