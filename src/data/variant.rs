//! # Variant Vocabulary
//!
//! Reference coordinates and the substitution/indel events observed on reads.
//! Event lists are kept sorted by coordinate everywhere in the crate, which
//! lets pattern comparison run as a single merge walk.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{QuasihapError, Result};

/// A reference position: 1-based base index plus an insertion ordinal.
///
/// Ordinal 0 addresses the reference base itself. Ordinal k >= 1 addresses
/// the k-th base inserted immediately after that reference base. The derived
/// ordering is lexicographic on (base, ordinal), so insertions sort between
/// their anchor base and the next one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefCoord {
    base: u32,
    ordinal: u32,
}

impl RefCoord {
    pub fn new(base: u32, ordinal: u32) -> Self {
        Self { base, ordinal }
    }

    /// Coordinate of a reference base (ordinal 0).
    pub fn base(base: u32) -> Self {
        Self { base, ordinal: 0 }
    }

    pub fn base_index(&self) -> u32 {
        self.base
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn is_insertion(&self) -> bool {
        self.ordinal > 0
    }

    /// Numeric view used when comparing against real-valued window bounds.
    /// Insertion ordinals map to epsilon offsets past the anchor base, so an
    /// inclusive bound at the anchor excludes its insertions.
    pub fn value(&self) -> f64 {
        f64::from(self.base) + f64::from(self.ordinal) * 1e-9
    }
}

impl fmt::Display for RefCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ordinal == 0 {
            write!(f, "{}", self.base)
        } else {
            write!(f, "{}.{}", self.base, self.ordinal)
        }
    }
}

impl FromStr for RefCoord {
    type Err = QuasihapError;

    /// Accepts `123` for a base and `123.2` for the second insertion after
    /// base 123. Zero-padded fractional digits (`123.002`) parse to the same
    /// ordinal, so legacy epsilon-style coordinates keep their ordering.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || QuasihapError::invalid_data(format!("invalid reference coordinate '{}'", s));
        match s.split_once('.') {
            None => {
                let base: u32 = s.parse().map_err(|_| bad())?;
                Ok(Self::base(base))
            }
            Some((base_str, ord_str)) => {
                let base: u32 = base_str.parse().map_err(|_| bad())?;
                if ord_str.is_empty() || !ord_str.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(bad());
                }
                let trimmed = ord_str.trim_start_matches('0');
                let ordinal: u32 = if trimmed.is_empty() {
                    0
                } else {
                    trimmed.parse().map_err(|_| bad())?
                };
                Ok(Self::new(base, ordinal))
            }
        }
    }
}

/// A single observed difference from the reference.
///
/// `from` is the reference symbol, `to` the observed one. Deletions carry an
/// observed `-`; insertions carry a reference `-` and a fractional
/// (ordinal > 0) coordinate anchored at the preceding base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Event {
    pub pos: RefCoord,
    pub from: u8,
    pub to: u8,
}

impl Event {
    pub fn new(pos: RefCoord, from: u8, to: u8) -> Self {
        Self { pos, from, to }
    }

    pub fn is_insertion(&self) -> bool {
        self.from == b'-'
    }

    pub fn is_deletion(&self) -> bool {
        self.to == b'-'
    }

    /// Indels get the lower homopolymer-run threshold during error modeling.
    pub fn is_indel(&self) -> bool {
        self.from == b'-' || self.to == b'-' || self.pos.is_insertion()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.from as char, self.pos, self.to as char)
    }
}

impl FromStr for Event {
    type Err = QuasihapError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || QuasihapError::invalid_data(format!("invalid event token '{}'", s));
        let mut parts = s.split('_');
        let (from, pos, to) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(f), Some(p), Some(t), None) => (f, p, t),
            _ => return Err(bad()),
        };
        let from = parse_symbol(from).ok_or_else(bad)?;
        let to = parse_symbol(to).ok_or_else(bad)?;
        let pos: RefCoord = pos.parse().map_err(|_| bad())?;
        Ok(Self::new(pos, from, to))
    }
}

fn parse_symbol(s: &str) -> Option<u8> {
    let mut bytes = s.bytes();
    let b = bytes.next()?.to_ascii_uppercase();
    if bytes.next().is_some() {
        return None;
    }
    matches!(b, b'A' | b'C' | b'G' | b'T' | b'-').then_some(b)
}

/// Render a sorted event list as a comma-separated pattern string.
pub fn encode_pattern(events: &[Event]) -> String {
    let tokens: Vec<String> = events.iter().map(Event::to_string).collect();
    tokens.join(",")
}

/// Parse a comma-separated pattern string. Empty strings and trailing commas
/// are tolerated; the result is sorted by coordinate.
pub fn parse_pattern(s: &str) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for token in s.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        events.push(token.parse()?);
    }
    events.sort_unstable();
    Ok(events)
}

/// Number of events present in exactly one of two sorted lists.
pub fn pattern_distance(a: &[Event], b: &[Event]) -> usize {
    let (mut i, mut j, mut d) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                i += 1;
                d += 1;
            }
            Ordering::Greater => {
                j += 1;
                d += 1;
            }
        }
    }
    d + (a.len() - i) + (b.len() - j)
}

/// The events present in exactly one of two sorted lists, in sorted order.
pub fn pattern_difference(a: &[Event], b: &[Event]) -> Vec<Event> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
