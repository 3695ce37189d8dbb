//! # Pipeline Module
//!
//! High-level orchestration of the reconstruction workflow. Coordinates
//! I/O, the partition search, chain extraction, and cluster merging.

pub mod reconstruct;

pub use reconstruct::ReconstructPipeline;
