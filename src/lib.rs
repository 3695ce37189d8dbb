//! # Quasihap Library Root
//!
//! Reconstruction of viral quasispecies haplotypes from overlapping-amplicon
//! read populations mapped to a reference genome.
//!
//! ## Module Structure
//! ```text
//! quasihap
//! ├── data        # In-memory representations (events, reads, reference, haplotypes)
//! ├── io          # File I/O (FASTA, read and overlap tables)
//! ├── model       # Algorithms (partition search, catalogs, chains, clustering)
//! ├── pipelines   # High-level orchestration (end-to-end reconstruction)
//! └── utils       # Helpers (statistics wrappers, threading)
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod model;
pub mod pipelines;
pub mod utils;
