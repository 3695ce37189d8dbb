//! # Reference Sequence
//!
//! The validated reference genome with 1-based addressing and precomputed
//! homopolymer-run lengths. Run context decides which error rate applies to
//! an observed difference: indels are homopolymeric in runs of two or more,
//! substitutions only in runs of three or more.

use crate::error::{QuasihapError, Result};

#[derive(Clone, Debug)]
pub struct Reference {
    name: String,
    seq: Vec<u8>,
    run_len: Vec<u32>,
}

impl Reference {
    /// Validate and store a sequence. Lowercase input is accepted; anything
    /// outside A/C/G/T is rejected.
    pub fn new(name: impl Into<String>, seq: impl Into<Vec<u8>>) -> Result<Self> {
        let seq: Vec<u8> = seq.into().iter().map(|b| b.to_ascii_uppercase()).collect();
        if seq.is_empty() {
            return Err(QuasihapError::invalid_data("reference sequence is empty"));
        }
        if let Some(pos) = seq
            .iter()
            .position(|b| !matches!(b, b'A' | b'C' | b'G' | b'T'))
        {
            return Err(QuasihapError::invalid_data(format!(
                "reference contains invalid symbol '{}' at position {}",
                seq[pos] as char,
                pos + 1
            )));
        }
        let run_len = homopolymer_runs(&seq);
        Ok(Self {
            name: name.into(),
            seq,
            run_len,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn bases(&self) -> &[u8] {
        &self.seq
    }

    /// Base at a 1-based position.
    pub fn base_at(&self, pos: u32) -> Option<u8> {
        if pos == 0 {
            return None;
        }
        self.seq.get(pos as usize - 1).copied()
    }

    /// Length of the maximal homopolymer run containing a 1-based position.
    /// Zero when out of range.
    pub fn run_length_at(&self, pos: u32) -> u32 {
        if pos == 0 {
            return 0;
        }
        self.run_len.get(pos as usize - 1).copied().unwrap_or(0)
    }

    /// Homopolymeric context for an error at `pos`: a run of 2 suffices for
    /// indels, substitutions need a run of 3.
    pub fn is_homopolymeric(&self, pos: u32, indel: bool) -> bool {
        let run = self.run_length_at(pos);
        if indel {
            run >= 2
        } else {
            run >= 3
        }
    }

    /// Number of positions in the 1-based closed range that lie inside any
    /// homopolymer run (length >= 2).
    pub fn homopolymer_positions(&self, lo: u32, hi: u32) -> u32 {
        if lo == 0 || lo > hi {
            return 0;
        }
        (lo..=hi.min(self.seq.len() as u32))
            .filter(|&p| self.run_length_at(p) >= 2)
            .count() as u32
    }
}

fn homopolymer_runs(seq: &[u8]) -> Vec<u32> {
    let mut runs = vec![0u32; seq.len()];
    let mut i = 0;
    while i < seq.len() {
        let mut j = i + 1;
        while j < seq.len() && seq[j] == seq[i] {
            j += 1;
        }
        let len = (j - i) as u32;
        for r in &mut runs[i..j] {
            *r = len;
        }
        i = j;
    }
    runs
}
