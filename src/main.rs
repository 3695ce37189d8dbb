//! # Quasihap: Viral Quasispecies Haplotype Reconstruction
//!
//! Reconstructs the distinct genome variants present in a mixed viral
//! population from overlapping-amplicon reads mapped to a reference.
//!
//! ## Usage
//! ```bash
//! quasihap --reads sample_reads.txt --ref hxb2.fasta --out sample
//! ```

use std::time::Instant;

mod config;
mod data;
mod error;
mod io;
mod model;
mod pipelines;
mod utils;

use config::Config;
use error::Result;
use pipelines::ReconstructPipeline;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let start = Instant::now();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse and validate configuration
    let config = Config::parse_and_validate()?;

    eprintln!("Quasihap v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Threads: {}", config.nthreads());
    eprintln!("Reads: {:?}", config.reads);
    eprintln!("Reference: {:?}", config.reference);

    let mut pipeline = ReconstructPipeline::new(config);
    pipeline.run()?;

    let elapsed = start.elapsed();
    eprintln!("Completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
