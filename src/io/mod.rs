//! # I/O Module
//!
//! File reading/writing boundaries. Converts between disk formats and the
//! in-memory read population, reference, and haplotype representations.

pub mod fasta;
pub mod tables;

// Re-export commonly used types
pub use fasta::{read_reference, write_haplotypes};
pub use tables::{read_read_table, write_overlap_table};
