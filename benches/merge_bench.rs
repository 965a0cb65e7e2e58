// Sort-merge benchmarks for mergetree

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mergetree::mergetree::compact::{DeduplicateMergeFunction, MergeFunction};
use mergetree::mergetree::SortMergeReader;
use mergetree::reader::from_records;
use mergetree::{row, KeyComparator, KeyValue, SortEngine};
use rand::Rng;
use std::hint::black_box;

/// `num_runs` sorted runs drawing keys from a shared range, so most keys overlap
fn generate_runs(num_runs: usize, per_run: usize) -> Vec<Vec<KeyValue>> {
    let mut rng = rand::rng();
    let mut seq = 0u64;
    (0..num_runs)
        .map(|_| {
            let mut keys: Vec<i64> =
                (0..per_run).map(|_| rng.random_range(0..(per_run as i64 * 2))).collect();
            keys.sort_unstable();
            keys.dedup();
            keys.into_iter()
                .map(|k| {
                    seq += 1;
                    KeyValue::insert(row![k], seq, row![k, format!("value{:08}", seq)])
                })
                .collect()
        })
        .collect()
}

fn benchmark_sort_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_merge");

    for num_runs in [2, 5, 10].iter() {
        let runs = generate_runs(*num_runs, 10_000);
        let total: usize = runs.iter().map(Vec::len).sum();
        group.throughput(Throughput::Elements(total as u64));

        for engine in [SortEngine::MinHeap, SortEngine::LoserTree, SortEngine::Buffered] {
            group.bench_with_input(BenchmarkId::new(engine.as_str(), num_runs), &runs, |b, runs| {
                b.iter(|| {
                    let readers = runs.iter().cloned().map(from_records).collect();
                    let reader = SortMergeReader::new(
                        readers,
                        KeyComparator::natural(),
                        MergeFunction::Deduplicate(DeduplicateMergeFunction::new(false)),
                        engine,
                    )
                    .unwrap();
                    for kv in reader {
                        black_box(kv.unwrap());
                    }
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_sort_engines);
criterion_main!(benches);
