use quasihap::config::Config;
use quasihap::data::haplotype::{merge_duplicates, normalize_frequencies, Haplotype};
use quasihap::data::read::{Read, ReadPopulation};
use quasihap::data::reference::Reference;
use quasihap::data::variant::parse_pattern;
use quasihap::error::QuasihapError;
use quasihap::model::chain::extract_with_shrink;
use quasihap::model::cluster::{consensus_merge, search_clusters, PoissonBicObjective};
use quasihap::model::search::PartitionSearch;
use quasihap::pipelines::ReconstructPipeline;
use rand::rngs::StdRng;
use rand::SeedableRng;

// --- Helpers ---

/// The minor strain's substitutions against the ACGT-repeat reference.
const STRAIN_EVENTS: [(u32, u8, u8); 6] = [
    (10, b'C', b'T'),
    (30, b'C', b'T'),
    (50, b'C', b'T'),
    (60, b'T', b'A'),
    (80, b'T', b'A'),
    (95, b'G', b'A'),
];

const REFERENCE_LEN: usize = 200;
const READ_SPAN: u32 = 119;

fn reference_bases() -> Vec<u8> {
    (0..REFERENCE_LEN).map(|i| b"ACGT"[i % 4]).collect()
}

fn synthetic_reference() -> Reference {
    Reference::new("synthetic", reference_bases()).expect("valid reference")
}

/// Comma-joined events of the minor strain visible to a read at `start`.
/// Every read is long enough to see all events at or past its start.
fn mutant_pattern(start: u32) -> String {
    STRAIN_EVENTS
        .iter()
        .filter(|(pos, _, _)| *pos >= start)
        .map(|(pos, from, to)| format!("{}_{}_{}", *from as char, pos, *to as char))
        .collect::<Vec<_>>()
        .join(",")
}

/// A 60/40 two-strain mixture: 21 amplicon start positions stepping by 4
/// across the reference, five reads per start (three reference-identical,
/// two carrying the minor strain's events).
fn two_strain_reads() -> Vec<Read> {
    let mut reads = Vec::new();
    for start in (1..=81u32).step_by(4) {
        let stop = (start + READ_SPAN) as f64;
        for i in 0..3 {
            reads.push(Read::new(
                format!("clean_{}_{}", start, i),
                start as f64,
                stop,
                Vec::new(),
            ));
        }
        let events = parse_pattern(&mutant_pattern(start)).expect("valid pattern");
        for i in 0..2 {
            reads.push(Read::new(
                format!("mut_{}_{}", start, i),
                start as f64,
                stop,
                events.clone(),
            ));
        }
    }
    reads
}

fn expected_clean_sequence() -> String {
    String::from_utf8(reference_bases()).unwrap()
}

fn expected_mutant_sequence() -> String {
    let mut bases = reference_bases();
    for (pos, _, to) in STRAIN_EVENTS {
        bases[(pos - 1) as usize] = to;
    }
    String::from_utf8(bases).unwrap()
}

fn two_strain_read_table() -> String {
    let mut table = String::from("name\tstart\tstop\tevents\n");
    for start in (1..=81u32).step_by(4) {
        let stop = start + READ_SPAN;
        for i in 0..3 {
            table.push_str(&format!("clean_{}_{}\t{}\t{}\t\n", start, i, start, stop));
        }
        for i in 0..2 {
            table.push_str(&format!(
                "mut_{}_{}\t{}\t{}\t{}\n",
                start,
                i,
                start,
                stop,
                mutant_pattern(start)
            ));
        }
    }
    table
}

fn test_config(reads: std::path::PathBuf, reference: std::path::PathBuf) -> Config {
    Config {
        reads,
        reference,
        out: None,
        homopolymer_err: 0.01,
        non_homopolymer_err: 0.005,
        iterations: 80,
        nthreads: Some(1),
        seed: Some(42),
    }
}

// --- Tests ---

#[test]
fn test_reconstructs_two_strain_mixture() {
    let population = ReadPopulation::new(two_strain_reads()).expect("non-empty population");
    let reference = synthetic_reference();

    let ranked = PartitionSearch::new(80, 7)
        .run(&population)
        .expect("partition search succeeds");
    let partition = ranked.into_selected();
    // Reads come in groups of five per start, so any window spanned at all
    // is spanned by at least five reads.
    assert!(
        partition.stats().min_coverage >= 5.0,
        "min coverage {}",
        partition.stats().min_coverage
    );

    let mut rng = StdRng::seed_from_u64(88);
    let extraction = extract_with_shrink(
        &population,
        partition.windows(),
        &reference,
        &mut rng,
        |_| Ok(()),
    )
    .expect("extraction succeeds");

    let mut raw = merge_duplicates(extraction.haplotypes);
    normalize_frequencies(&mut raw);

    assert_eq!(raw.len(), 2, "expected the two planted strains");
    assert!(
        (raw[0].frequency - 60.0).abs() < 1e-6,
        "major strain frequency {}",
        raw[0].frequency
    );
    assert!(
        (raw[1].frequency - 40.0).abs() < 1e-6,
        "minor strain frequency {}",
        raw[1].frequency
    );
    assert_eq!(raw[0].sequence(), expected_clean_sequence());
    assert_eq!(raw[1].sequence(), expected_mutant_sequence());
}

#[test]
fn test_clustering_keeps_distinct_strains() {
    let reference = synthetic_reference();
    let clean = Haplotype::new(Vec::new(), 60.0);
    let mutant = Haplotype::new(parse_pattern(&mutant_pattern(1)).unwrap(), 40.0);
    let raw = vec![clean, mutant];

    // Six substitutions against an expected error count of one per read
    // overwhelm the model-size penalty, so both strains survive.
    let objective = PoissonBicObjective::new(&reference, 1.0, 200.0, 0.01, 0.005);
    let mut rng = StdRng::seed_from_u64(5);
    let subset = search_clusters(&raw, &objective, 200, 2, &mut rng);
    assert_eq!(subset, vec![0, 1]);

    let merged = consensus_merge(&raw, &subset, &reference, 1.0, 200.0);
    assert_eq!(merged.len(), 2);
    assert!((merged[0].frequency - 60.0).abs() < 1e-6);
    assert!((merged[1].frequency - 40.0).abs() < 1e-6);
    assert_eq!(merged[1].sequence(), expected_mutant_sequence());
}

#[test]
fn test_pipeline_end_to_end_on_files() {
    let dir = tempfile::tempdir().unwrap();
    let reads_path = dir.path().join("mixture_reads.txt");
    std::fs::write(&reads_path, two_strain_read_table()).unwrap();
    let ref_path = dir.path().join("synthetic.fasta");
    std::fs::write(
        &ref_path,
        format!(">synthetic\n{}\n", expected_clean_sequence()),
    )
    .unwrap();

    let out_prefix = dir.path().join("mixture").to_string_lossy().into_owned();
    let mut config = test_config(reads_path, ref_path);
    config.out = Some(out_prefix.clone());
    config.nthreads = Some(2);
    ReconstructPipeline::new(config).run().expect("pipeline run");

    let final_fasta =
        std::fs::read_to_string(format!("{}_haplotypes.fasta", out_prefix)).unwrap();
    let lines: Vec<&str> = final_fasta.split("\r\n").collect();
    assert_eq!(lines[0], ">0_60");
    assert_eq!(lines[1], expected_clean_sequence());
    assert_eq!(lines[2], ">1_40");
    assert_eq!(lines[3], expected_mutant_sequence());

    // Both strains are real, so clustering must not collapse the raw set.
    let raw_fasta =
        std::fs::read_to_string(format!("{}_haplotypes_raw.fasta", out_prefix)).unwrap();
    assert_eq!(raw_fasta, final_fasta);

    let overlap =
        std::fs::read_to_string(format!("{}_overlap_table.tsv", out_prefix)).unwrap();
    assert!(overlap.starts_with("window_index\t"));
}

#[test]
fn test_same_seed_reproduces_final_set() {
    let dir = tempfile::tempdir().unwrap();
    let reads_path = dir.path().join("mixture_reads.txt");
    std::fs::write(&reads_path, two_strain_read_table()).unwrap();
    let ref_path = dir.path().join("synthetic.fasta");
    std::fs::write(
        &ref_path,
        format!(">synthetic\n{}\n", expected_clean_sequence()),
    )
    .unwrap();

    let run = |tag: &str| {
        let out_prefix = dir.path().join(tag).to_string_lossy().into_owned();
        let mut config = test_config(reads_path.clone(), ref_path.clone());
        config.out = Some(out_prefix.clone());
        ReconstructPipeline::new(config).run().expect("pipeline run");
        std::fs::read_to_string(format!("{}_haplotypes.fasta", out_prefix)).unwrap()
    };

    assert_eq!(run("first"), run("second"));
}

#[test]
fn test_search_fails_without_overlap_support() {
    // Two read islands with a wide gap: no window chain can be covered.
    let mut reads = Vec::new();
    for i in 0..3 {
        reads.push(Read::new(format!("left_{}", i), 1.0, 50.0, Vec::new()));
        reads.push(Read::new(format!("right_{}", i), 500.0, 560.0, Vec::new()));
    }
    let population = ReadPopulation::new(reads).unwrap();

    let err = PartitionSearch::new(30, 3)
        .run(&population)
        .expect_err("no partition should survive");
    assert!(matches!(err, QuasihapError::Search { .. }));
}
