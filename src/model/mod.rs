//! # Model Module
//!
//! The reconstruction algorithms, in pipeline order.
//!
//! ## Stages
//! - `partition`: window partitions over the aligned region, their ten
//!   descriptive statistics, and the randomized partition generator
//! - `search`: the two-phase partition search and posterior ranking
//! - `catalog`: per-window variant catalogs keyed by overlap patterns
//! - `chain`: the catalog chain and iterative haplotype extraction
//! - `cluster`: posterior cluster search and consensus merge of the raw
//!   haplotype list

pub mod catalog;
pub mod chain;
pub mod cluster;
pub mod partition;
pub mod search;

// Re-export commonly used types
pub use catalog::VariantCatalog;
pub use chain::{extract_with_shrink, CatalogChain, ChainExtraction};
pub use cluster::{consensus_merge, search_clusters, ClusterObjective, PoissonBicObjective};
pub use partition::{Window, WindowPartition};
pub use search::{PartitionSearch, RankedPartitions};
