//! # Reconstruction Pipeline
//!
//! Orchestrates the full workflow:
//! 1. Load the reference genome and the aligned read table
//! 2. Search for a well-supported window partition over the covered region
//! 3. Catalog per-window variant patterns and extract haplotypes along the
//!    catalog chain, shrinking the partition when a pass yields nothing
//! 4. Cluster the raw haplotypes under a Poisson BIC objective and collapse
//!    each cluster onto its consensus
//! 5. Write the raw and final haplotype sets

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, info_span};

use crate::config::Config;
use crate::data::haplotype::{merge_duplicates, normalize_frequencies, Haplotype};
use crate::data::read::ReadPopulation;
use crate::data::reference::Reference;
use crate::error::{QuasihapError, Result};
use crate::io::fasta::{read_reference, write_haplotypes};
use crate::io::tables::{read_read_table, write_overlap_table};
use crate::model::chain::{extract_with_shrink, ChainExtraction};
use crate::model::cluster::{consensus_merge, search_clusters, PoissonBicObjective};
use crate::model::partition::WindowPartition;
use crate::model::search::PartitionSearch;
use crate::utils::threading::build_thread_pool;

/// Haplotype reconstruction pipeline
pub struct ReconstructPipeline {
    config: Config,
}

impl ReconstructPipeline {
    /// Create a new reconstruction pipeline
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the reconstruction pipeline
    pub fn run(&mut self) -> Result<()> {
        let prefix = self.config.out_prefix();

        let (reference, population) = self.load_inputs()?;

        // One master seed drives every randomized stage. Log it so any run
        // can be replayed with --seed.
        let seed = self.config.seed.unwrap_or_else(rand::random);
        info!(seed, "master seed");

        let partition = self.select_partition(&population, seed)?;

        // The partition search consumed seed offsets 0..=iterations; the
        // remaining stages share one stream past that range.
        let mut rng =
            StdRng::seed_from_u64(seed.wrapping_add(self.config.iterations as u64 + 1));

        let extraction = self.extract_haplotypes(
            &population,
            &partition,
            &reference,
            &prefix,
            &mut rng,
        )?;

        let mut raw = merge_duplicates(extraction.haplotypes);
        normalize_frequencies(&mut raw);
        info!(
            haplotypes = raw.len(),
            windows_used = extraction.windows_used,
            "raw haplotype set assembled"
        );
        write_haplotypes(
            &PathBuf::from(format!("{}_haplotypes_raw.fasta", prefix)),
            &raw,
        )?;

        let final_set = if raw.len() > 1 {
            self.cluster_haplotypes(
                &raw,
                &reference,
                extraction.span_start,
                extraction.span_stop,
                &mut rng,
            )
        } else {
            raw.clone()
        };
        write_haplotypes(
            &PathBuf::from(format!("{}_haplotypes.fasta", prefix)),
            &final_set,
        )?;
        info!(
            raw = raw.len(),
            merged = final_set.len(),
            "haplotype sets written"
        );
        Ok(())
    }

    fn load_inputs(&self) -> Result<(Reference, ReadPopulation)> {
        let _span = info_span!("load").entered();
        let reference = read_reference(&self.config.reference)?;
        let reads = read_read_table(&self.config.reads)?;
        let population = ReadPopulation::new(reads)?;
        info!(
            reads = population.len(),
            reference = reference.name(),
            reference_len = reference.len(),
            span_start = population.span_start(),
            span_stop = population.span_stop(),
            mean_read_length = population.mean_read_length(),
            "inputs loaded"
        );
        Ok((reference, population))
    }

    fn select_partition(
        &self,
        population: &ReadPopulation,
        seed: u64,
    ) -> Result<WindowPartition> {
        let _span = info_span!("partition_search").entered();
        let pool = build_thread_pool(self.config.nthreads())?;
        let search = PartitionSearch::new(self.config.iterations, seed);
        let ranked = pool.install(|| search.run(population))?;
        info!(
            candidates = ranked.len(),
            credible = ranked.credible_len(),
            "partition candidates ranked"
        );
        let partition = ranked.into_selected();
        let stats = partition.stats();
        info!(
            windows = partition.len(),
            min_coverage = stats.min_coverage,
            mean_coverage = stats.mean_coverage,
            min_overlap_diversity = stats.min_overlap_diversity,
            mean_overlap_diversity = stats.mean_overlap_diversity,
            nonzero_diversity_fraction = stats.nonzero_diversity_fraction,
            min_overlap_length = stats.min_overlap_length,
            mean_overlap_length = stats.mean_overlap_length,
            min_window_length = stats.min_window_length,
            mean_window_length = stats.mean_window_length,
            "working partition selected"
        );
        Ok(partition)
    }

    fn extract_haplotypes(
        &self,
        population: &ReadPopulation,
        partition: &WindowPartition,
        reference: &Reference,
        prefix: &str,
        rng: &mut StdRng,
    ) -> Result<ChainExtraction> {
        let _span = info_span!("chain_extraction").entered();
        // Rewritten on every retry so the table always describes the chain
        // the extraction actually ran on.
        let overlap_path = PathBuf::from(format!("{}_overlap_table.tsv", prefix));
        let extraction = extract_with_shrink(
            population,
            partition.windows(),
            reference,
            rng,
            |chain| write_overlap_table(&overlap_path, chain),
        )?;
        if extraction.haplotypes.is_empty() {
            return Err(QuasihapError::search(
                "no haplotypes could be reconstructed from any window partition",
            ));
        }
        Ok(extraction)
    }

    fn cluster_haplotypes(
        &self,
        raw: &[Haplotype],
        reference: &Reference,
        span_start: f64,
        span_stop: f64,
        rng: &mut StdRng,
    ) -> Vec<Haplotype> {
        let _span = info_span!("cluster_merge").entered();
        let objective = PoissonBicObjective::new(
            reference,
            span_start,
            span_stop,
            self.config.homopolymer_err,
            self.config.non_homopolymer_err,
        );
        let subset = search_clusters(
            raw,
            &objective,
            self.config.iterations,
            self.config.nthreads(),
            rng,
        );
        let merged = consensus_merge(raw, &subset, reference, span_start, span_stop);
        let mut merged = merge_duplicates(merged);
        normalize_frequencies(&mut merged);
        info!(
            representatives = subset.len(),
            haplotypes = merged.len(),
            "cluster merge finished"
        );
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn synthetic_read_table() -> String {
        // Two strains over a 200-base region: a reference-identical majority
        // and a C_90_T minority, every read spanning [1, 200].
        let mut table = String::from("name\tstart\tstop\tevents\n");
        for i in 0..6 {
            table.push_str(&format!("clean{}\t1\t200\t\n", i));
        }
        for i in 0..4 {
            table.push_str(&format!("mut{}\t1\t200\tC_90_T\n", i));
        }
        table
    }

    fn synthetic_reference() -> String {
        let seq: String = (0..200).map(|i| b"ACGT"[i % 4] as char).collect();
        format!(">synthetic\n{}\n", seq)
    }

    #[test]
    fn test_pipeline_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let reads = write_file(&dir, "sample.txt", &synthetic_read_table());
        let reference = write_file(&dir, "ref.fasta", &synthetic_reference());
        let out_prefix = dir.path().join("run").to_string_lossy().into_owned();

        let config = Config {
            reads,
            reference,
            out: Some(out_prefix.clone()),
            homopolymer_err: 0.01,
            non_homopolymer_err: 0.005,
            iterations: 40,
            nthreads: Some(1),
            seed: Some(11),
        };
        ReconstructPipeline::new(config).run().unwrap();

        let raw = std::fs::read_to_string(format!("{}_haplotypes_raw.fasta", out_prefix)).unwrap();
        let merged = std::fs::read_to_string(format!("{}_haplotypes.fasta", out_prefix)).unwrap();
        let overlaps =
            std::fs::read_to_string(format!("{}_overlap_table.tsv", out_prefix)).unwrap();

        // 60/40 split reconstructed exactly from full-span reads.
        assert_eq!(raw.matches('>').count(), 2);
        assert!(raw.contains(">0_60\r\n"));
        assert!(raw.contains(">1_40\r\n"));
        assert!(!merged.is_empty());
        assert!(overlaps.starts_with("window_index\t"));
    }

    #[test]
    fn test_pipeline_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let reads = write_file(&dir, "sample.txt", &synthetic_read_table());
        let reference = write_file(&dir, "ref.fasta", &synthetic_reference());

        let run = |tag: &str| {
            let out_prefix = dir.path().join(tag).to_string_lossy().into_owned();
            let config = Config {
                reads: reads.clone(),
                reference: reference.clone(),
                out: Some(out_prefix.clone()),
                homopolymer_err: 0.01,
                non_homopolymer_err: 0.005,
                iterations: 40,
                nthreads: Some(1),
                seed: Some(23),
            };
            ReconstructPipeline::new(config).run().unwrap();
            std::fs::read_to_string(format!("{}_haplotypes.fasta", out_prefix)).unwrap()
        };

        assert_eq!(run("a"), run("b"));
    }
}
