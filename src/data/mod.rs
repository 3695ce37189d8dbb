//! # Data Module
//!
//! In-memory representations of genomic data. This is the core "Model" layer.
//!
//! - `variant`: reference coordinates and substitution/indel events
//! - `read`: corrected reads and population statistics
//! - `reference`: validated reference sequence with homopolymer context
//! - `haplotype`: reconstructed full-span variants

pub mod haplotype;
pub mod read;
pub mod reference;
pub mod variant;

// Re-export commonly used types
pub use haplotype::Haplotype;
pub use read::{Read, ReadPopulation};
pub use reference::Reference;
pub use variant::{Event, RefCoord};
