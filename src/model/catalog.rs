//! # Variant Catalogs
//!
//! Per-window catalogs of the distinct event patterns carried by spanning
//! reads. Each pattern is split into three keys against the window's overlap
//! bounds; the right key of one window matching the left key of the next is
//! the adjacency predicate the chain search is built on.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::data::read::ReadPopulation;
use crate::data::variant::Event;

/// Boundary coordinates of one catalog window: the window's own span plus
/// the adjacent windows' bounds delimiting the shared overlap regions.
#[derive(Clone, Copy, Debug)]
pub struct CatalogBounds {
    pub start: f64,
    pub mid_prev: f64,
    pub mid_next: f64,
    pub stop: f64,
}

/// One distinct local pattern with its split keys and relative frequency.
#[derive(Clone, Debug)]
pub struct VariantPattern {
    /// Full event list over `[start, stop]`.
    pub events: Vec<Event>,
    /// Events in `[start, mid_prev]`, shared with the previous window.
    pub left: Vec<Event>,
    /// Events strictly between the overlap regions.
    pub core: Vec<Event>,
    /// Events in `[mid_next, stop]`, shared with the next window.
    pub right: Vec<Event>,
    pub frequency: f64,
}

impl VariantPattern {
    /// Adjacency: this pattern's right key equals `next`'s left key.
    pub fn overlaps(&self, next: &VariantPattern) -> bool {
        self.right == next.left
    }
}

/// All retained patterns of one window, ordered by descending frequency.
#[derive(Clone, Debug)]
pub struct VariantCatalog {
    bounds: CatalogBounds,
    patterns: Vec<VariantPattern>,
}

impl VariantCatalog {
    /// Catalog the reads spanning the window: group by full pattern, drop
    /// patterns seen fewer than twice, and normalize the retained
    /// frequencies to sum to 100.
    pub fn build(population: &ReadPopulation, bounds: CatalogBounds) -> Self {
        let mut groups: HashMap<Vec<Event>, f64> = HashMap::new();
        for read in population.reads() {
            if !read.spans(bounds.start, bounds.stop) {
                continue;
            }
            let full = read.events_in(bounds.start, bounds.stop).to_vec();
            *groups.entry(full).or_insert(0.0) += 1.0;
        }
        let total: f64 = groups.values().filter(|&&count| count >= 2.0).sum();
        let mut patterns: Vec<VariantPattern> = groups
            .into_iter()
            .filter(|(_, count)| *count >= 2.0)
            .map(|(events, count)| {
                let left = slice_range(&events, bounds.start, bounds.mid_prev);
                let core = slice_range(&events, bounds.mid_prev + 1.0, bounds.mid_next - 1.0);
                let right = slice_range(&events, bounds.mid_next, bounds.stop);
                VariantPattern {
                    events,
                    left,
                    core,
                    right,
                    frequency: 100.0 * count / total,
                }
            })
            .collect();
        sort_by_frequency(&mut patterns);
        Self { bounds, patterns }
    }

    pub fn bounds(&self) -> CatalogBounds {
        self.bounds
    }

    pub fn patterns(&self) -> &[VariantPattern] {
        &self.patterns
    }

    pub fn pattern(&self, idx: usize) -> &VariantPattern {
        &self.patterns[idx]
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn sort_by_frequency(&mut self) {
        sort_by_frequency(&mut self.patterns);
    }

    /// Zero the frequency of every pattern without an overlap partner in the
    /// next window's catalog. Partners are matched on keys alone, so a
    /// partner whose own frequency was just zeroed still counts.
    pub fn zero_unsupported(&mut self, next: &VariantCatalog) {
        for pattern in &mut self.patterns {
            if !next.patterns.iter().any(|q| pattern.overlaps(q)) {
                pattern.frequency = 0.0;
            }
        }
    }

    /// Remove patterns at or below zero frequency.
    pub fn remove_depleted(&mut self) {
        self.patterns.retain(|p| p.frequency > 0.0);
    }

    /// Subtract extracted mass from one pattern, flooring at zero.
    pub fn subtract_at(&mut self, idx: usize, amount: f64) {
        let f = &mut self.patterns[idx].frequency;
        *f = (*f - amount).max(0.0);
    }
}

/// Descending frequency; equal frequencies fall back to event-list order so
/// catalog order never depends on hash iteration.
fn sort_by_frequency(patterns: &mut [VariantPattern]) {
    patterns.sort_by(|a, b| {
        b.frequency
            .partial_cmp(&a.frequency)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.events.cmp(&b.events))
    });
}

fn slice_range(events: &[Event], start: f64, stop: f64) -> Vec<Event> {
    events
        .iter()
        .filter(|e| {
            let v = e.pos.value();
            v >= start && v <= stop
        })
        .copied()
        .collect()
}
