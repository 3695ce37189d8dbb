//! # Reconstructed Haplotypes
//!
//! A haplotype is a full-span event list with an estimated relative
//! frequency. Its nucleotide sequence is derived on demand by substituting
//! the events into the reference: deletions drop out, insertions interleave
//! after their anchor base in ordinal order.

use std::collections::BTreeMap;

use crate::data::reference::Reference;
use crate::data::variant::{encode_pattern, Event, RefCoord};

#[derive(Clone, Debug)]
pub struct Haplotype {
    pub events: Vec<Event>,
    pub frequency: f64,
    sequence: String,
}

impl Haplotype {
    pub fn new(mut events: Vec<Event>, frequency: f64) -> Self {
        events.sort_unstable();
        Self {
            events,
            frequency,
            sequence: String::new(),
        }
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn pattern(&self) -> String {
        encode_pattern(&self.events)
    }

    /// Render the sequence over the closed span `[start, stop]`. Fractional
    /// bounds truncate the way window bounds truncate everywhere else: the
    /// first base is `floor(start - 1) + 1`, the last `floor(stop)`.
    pub fn derive_sequence(&mut self, reference: &Reference, start: f64, stop: f64) {
        let first = (start - 1.0).max(0.0) as u32 + 1;
        let last = (stop.max(0.0) as u32).min(reference.len() as u32);
        let mut symbols: BTreeMap<RefCoord, u8> = BTreeMap::new();
        for pos in first..=last {
            if let Some(b) = reference.base_at(pos) {
                symbols.insert(RefCoord::base(pos), b);
            }
        }
        for ev in &self.events {
            symbols.insert(ev.pos, ev.to);
        }
        self.sequence = symbols
            .into_values()
            .filter(|&b| b != b'-')
            .map(|b| b as char)
            .collect();
    }
}

/// Merge haplotypes whose derived sequences are identical, summing their
/// frequencies. First-seen order is preserved.
pub fn merge_duplicates(haplotypes: Vec<Haplotype>) -> Vec<Haplotype> {
    let mut out: Vec<Haplotype> = Vec::with_capacity(haplotypes.len());
    for hap in haplotypes {
        match out.iter_mut().find(|o| o.sequence == hap.sequence) {
            Some(existing) => existing.frequency += hap.frequency,
            None => out.push(hap),
        }
    }
    out
}

/// Rescale frequencies so they sum to 100.
pub fn normalize_frequencies(haplotypes: &mut [Haplotype]) {
    let total: f64 = haplotypes.iter().map(|h| h.frequency).sum();
    if total > 0.0 {
        for hap in haplotypes {
            hap.frequency *= 100.0 / total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::variant::parse_pattern;

    fn reference() -> Reference {
        Reference::new("ref", b"ACGTACGTAC".to_vec()).unwrap()
    }

    fn hap(pattern: &str, frequency: f64) -> Haplotype {
        Haplotype::new(parse_pattern(pattern).unwrap(), frequency)
    }

    #[test]
    fn test_sequence_plain_substitution() {
        let mut h = hap("C_2_T", 50.0);
        h.derive_sequence(&reference(), 1.0, 10.0);
        assert_eq!(h.sequence(), "ATGTACGTAC");
    }

    #[test]
    fn test_sequence_deletion_drops_base() {
        let mut h = hap("G_3_-", 50.0);
        h.derive_sequence(&reference(), 1.0, 10.0);
        assert_eq!(h.sequence(), "ACTACGTAC");
    }

    #[test]
    fn test_sequence_insertion_after_anchor() {
        let mut h = hap("-_2.1_A,-_2.2_A", 50.0);
        h.derive_sequence(&reference(), 1.0, 10.0);
        assert_eq!(h.sequence(), "ACAAGTACGTAC");
    }

    #[test]
    fn test_sequence_fractional_span_truncates() {
        let mut h = hap("", 100.0);
        h.derive_sequence(&reference(), 2.5, 8.5);
        // Bases 2..=8 of ACGTACGTAC.
        assert_eq!(h.sequence(), "CGTACGT");
    }

    #[test]
    fn test_merge_duplicates_by_sequence() {
        let reference = reference();
        let mut a = hap("C_2_T", 60.0);
        let mut b = hap("C_2_T", 25.0);
        let mut c = hap("", 15.0);
        a.derive_sequence(&reference, 1.0, 10.0);
        b.derive_sequence(&reference, 1.0, 10.0);
        c.derive_sequence(&reference, 1.0, 10.0);
        let merged = merge_duplicates(vec![a, b, c]);
        assert_eq!(merged.len(), 2);
        assert!((merged[0].frequency - 85.0).abs() < 1e-9);
        assert!((merged[1].frequency - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_to_one_hundred() {
        let mut haps = vec![hap("", 30.0), hap("C_2_T", 10.0)];
        normalize_frequencies(&mut haps);
        assert!((haps[0].frequency - 75.0).abs() < 1e-9);
        assert!((haps[1].frequency - 25.0).abs() < 1e-9);
        let total: f64 = haps.iter().map(|h| h.frequency).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }
}
