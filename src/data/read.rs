//! # Read Population
//!
//! Corrected, aligned reads and the population-level statistics every
//! downstream stage shares: the reference span hull and the read-length
//! distribution that drives window-size proposals.

use crate::data::variant::{pattern_distance, Event};
use crate::error::{QuasihapError, Result};
use crate::utils::stats;

/// One aligned, corrected read: a real-valued reference span plus the sorted
/// list of events observed inside it.
#[derive(Clone, Debug)]
pub struct Read {
    pub name: String,
    pub start: f64,
    pub stop: f64,
    events: Vec<Event>,
}

impl Read {
    pub fn new(name: impl Into<String>, start: f64, stop: f64, mut events: Vec<Event>) -> Self {
        events.sort_unstable();
        Self {
            name: name.into(),
            start,
            stop,
            events,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// True when the read covers the whole closed interval.
    pub fn spans(&self, start: f64, stop: f64) -> bool {
        self.start <= start && self.stop >= stop
    }

    /// Events whose coordinate falls inside the closed interval. Insertion
    /// coordinates sit an epsilon past their anchor base, so an inclusive
    /// stop at the anchor excludes them.
    pub fn events_in(&self, start: f64, stop: f64) -> &[Event] {
        let lo = self.events.partition_point(|e| e.pos.value() < start);
        let hi = self.events.partition_point(|e| e.pos.value() <= stop);
        &self.events[lo..hi]
    }

    /// Inserted bases count toward the read's effective length.
    pub fn insertion_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_insertion()).count()
    }

    /// Event-set distance to another read, restricted to a closed interval.
    pub fn distance_in(&self, other: &Read, start: f64, stop: f64) -> usize {
        pattern_distance(self.events_in(start, stop), other.events_in(start, stop))
    }
}

/// The full corrected read population with its derived statistics.
#[derive(Clone, Debug)]
pub struct ReadPopulation {
    reads: Vec<Read>,
    span_start: f64,
    span_stop: f64,
    mean_read_length: f64,
    read_length_std: f64,
}

impl ReadPopulation {
    /// Build the population and its summary statistics. Fails on an empty
    /// read set: with no reads there is nothing to partition and every
    /// downstream stage is undefined.
    pub fn new(reads: Vec<Read>) -> Result<Self> {
        if reads.is_empty() {
            return Err(QuasihapError::invalid_data("read population is empty"));
        }
        let span_start = reads.iter().map(|r| r.start).fold(f64::INFINITY, f64::min);
        let span_stop = reads
            .iter()
            .map(|r| r.stop)
            .fold(f64::NEG_INFINITY, f64::max);
        let lengths: Vec<f64> = reads
            .iter()
            .map(|r| r.insertion_count() as f64 + r.stop - r.start)
            .collect();
        let mean_read_length = stats::mean(&lengths);
        let read_length_std = stats::std_dev(&lengths);
        Ok(Self {
            reads,
            span_start,
            span_stop,
            mean_read_length,
            read_length_std,
        })
    }

    pub fn reads(&self) -> &[Read] {
        &self.reads
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Leftmost read start.
    pub fn span_start(&self) -> f64 {
        self.span_start
    }

    /// Rightmost read stop.
    pub fn span_stop(&self) -> f64 {
        self.span_stop
    }

    /// Mean effective read length (aligned span plus insertions).
    pub fn mean_read_length(&self) -> f64 {
        self.mean_read_length
    }

    pub fn read_length_std(&self) -> f64 {
        self.read_length_std
    }

    /// Indices of reads spanning the whole closed interval.
    pub fn spanning(&self, start: f64, stop: f64) -> Vec<usize> {
        self.reads
            .iter()
            .enumerate()
            .filter(|(_, r)| r.spans(start, stop))
            .map(|(i, _)| i)
            .collect()
    }
}
