use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use quasihap::data::read::{Read, ReadPopulation};
use quasihap::data::reference::Reference;
use quasihap::data::variant::parse_pattern;
use quasihap::model::chain::extract_with_shrink;
use quasihap::model::partition::{Window, WindowPartition};
use quasihap::model::search::PartitionSearch;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A 60/40 two-strain amplicon mixture over a 200 bp span, `depth` whole
/// 3+2 read groups per start position.
fn mixture_population(depth: usize) -> ReadPopulation {
    let events = [
        (10u32, 'C', 'T'),
        (30, 'C', 'T'),
        (50, 'C', 'T'),
        (60, 'T', 'A'),
        (80, 'T', 'A'),
        (95, 'G', 'A'),
    ];
    let mut reads = Vec::new();
    for start in (1..=81u32).step_by(4) {
        let stop = (start + 119) as f64;
        let pattern = events
            .iter()
            .filter(|(pos, _, _)| *pos >= start)
            .map(|(pos, from, to)| format!("{}_{}_{}", from, pos, to))
            .collect::<Vec<_>>()
            .join(",");
        let parsed = parse_pattern(&pattern).unwrap();
        for i in 0..3 * depth {
            reads.push(Read::new(
                format!("clean_{}_{}", start, i),
                start as f64,
                stop,
                Vec::new(),
            ));
        }
        for i in 0..2 * depth {
            reads.push(Read::new(
                format!("mut_{}_{}", start, i),
                start as f64,
                stop,
                parsed.clone(),
            ));
        }
    }
    ReadPopulation::new(reads).unwrap()
}

fn reference() -> Reference {
    let seq: Vec<u8> = (0..200).map(|i| b"ACGT"[i % 4]).collect();
    Reference::new("ref", seq).unwrap()
}

fn fixed_windows() -> Vec<Window> {
    vec![
        Window::new(1.0, 100.0),
        Window::new(80.0, 160.0),
        Window::new(140.0, 200.0),
    ]
}

fn bench_partition_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition_stats");
    for depth in [1usize, 4, 16] {
        let population = mixture_population(depth);
        group.throughput(Throughput::Elements(population.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(population.len()),
            &population,
            |b, pop| {
                b.iter(|| {
                    let mut rng = StdRng::seed_from_u64(11);
                    WindowPartition::new(black_box(fixed_windows()), pop, &mut rng)
                });
            },
        );
    }
    group.finish();
}

fn bench_chain_extraction(c: &mut Criterion) {
    let reference = reference();
    let windows = fixed_windows();
    let mut group = c.benchmark_group("chain_extraction");
    for depth in [1usize, 4, 16] {
        let population = mixture_population(depth);
        group.throughput(Throughput::Elements(population.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(population.len()),
            &population,
            |b, pop| {
                b.iter(|| {
                    let mut rng = StdRng::seed_from_u64(7);
                    extract_with_shrink(pop, black_box(&windows), &reference, &mut rng, |_| Ok(()))
                        .unwrap()
                });
            },
        );
    }
    group.finish();
}

fn bench_partition_search(c: &mut Criterion) {
    let population = mixture_population(1);
    let mut group = c.benchmark_group("partition_search");
    group.sample_size(10);
    for trials in [10usize, 40] {
        group.throughput(Throughput::Elements(trials as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(trials),
            &trials,
            |b, &trials| {
                b.iter(|| {
                    PartitionSearch::new(trials, 7)
                        .run(black_box(&population))
                        .unwrap()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_partition_stats,
    bench_chain_extraction,
    bench_partition_search
);
criterion_main!(benches);
