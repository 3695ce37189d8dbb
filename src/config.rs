//! # Configuration Logic
//!
//! CLI argument parsing and validation.
//!
//! ```bash
//! quasihap --reads amplicons.txt --ref hxb2.fasta --out run1 --iterations 3000
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::error::{QuasihapError, Result};
use crate::utils::threading::default_worker_count;

/// Reconstruct viral haplotypes from aligned amplicon reads.
#[derive(Debug, Clone, Parser)]
#[command(name = "quasihap", version, about)]
pub struct Config {
    /// Tab-separated read table (name, start, stop, events), optionally gzipped
    #[arg(long)]
    pub reads: PathBuf,

    /// Reference genome FASTA with a single record, optionally gzipped
    #[arg(long = "ref")]
    pub reference: PathBuf,

    /// Output prefix (default: the read table's file stem)
    #[arg(long)]
    pub out: Option<String>,

    /// Sequencing error rate inside homopolymeric runs
    #[arg(long, default_value_t = 0.01)]
    pub homopolymer_err: f64,

    /// Sequencing error rate outside homopolymeric runs
    #[arg(long, default_value_t = 0.005)]
    pub non_homopolymer_err: f64,

    /// Randomized trials for the partition search and the cluster search
    #[arg(long, default_value_t = 3000)]
    pub iterations: usize,

    /// Number of worker threads (default: all cores but one)
    #[arg(long)]
    pub nthreads: Option<usize>,

    /// Random seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Config {
    /// Parse command-line arguments and validate them.
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.reads.exists() {
            return Err(QuasihapError::file_not_found(&self.reads));
        }
        if !self.reference.exists() {
            return Err(QuasihapError::file_not_found(&self.reference));
        }
        for (name, rate) in [
            ("homopolymer-err", self.homopolymer_err),
            ("non-homopolymer-err", self.non_homopolymer_err),
        ] {
            if !(rate > 0.0 && rate < 1.0) {
                return Err(QuasihapError::config(format!(
                    "{} must lie strictly between 0 and 1, got {}",
                    name, rate
                )));
            }
        }
        if self.iterations == 0 {
            return Err(QuasihapError::config("iterations must be positive"));
        }
        if self.nthreads == Some(0) {
            return Err(QuasihapError::config("nthreads must be positive"));
        }
        Ok(())
    }

    /// Number of worker threads to use.
    pub fn nthreads(&self) -> usize {
        self.nthreads.unwrap_or_else(default_worker_count)
    }

    /// Prefix for all output files.
    pub fn out_prefix(&self) -> String {
        match &self.out {
            Some(prefix) => prefix.clone(),
            None => self
                .reads
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "quasihap".to_string()),
        }
    }
}
