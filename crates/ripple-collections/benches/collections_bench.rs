//! Benchmarks for the observable containers.
//!
//! Run with: cargo bench -p ripple-collections

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use ripple_collections::{
    CachingList, CachingMap, ChangeSet, EvictionConfig, ObservableList, ObservableMap, TrimEnd,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Deterministic pseudo-random sequence (simple LCG).
fn keys(count: u64) -> Vec<u64> {
    (0..count)
        .map(|i| i.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407))
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Append growth, with and without a subscriber
// ---------------------------------------------------------------------------

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("list/append");

    for count in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count));

        group.bench_with_input(BenchmarkId::new("vec", count), &count, |b, &count| {
            b.iter(|| {
                let mut v = Vec::new();
                for i in 0..count {
                    v.push(i);
                }
                black_box(v.len())
            })
        });

        group.bench_with_input(BenchmarkId::new("silent", count), &count, |b, &count| {
            b.iter(|| {
                let mut list = ObservableList::new();
                for i in 0..count {
                    list.add(i);
                }
                black_box(list.len())
            })
        });

        group.bench_with_input(BenchmarkId::new("observed", count), &count, |b, &count| {
            b.iter(|| {
                let mut list = ObservableList::new();
                let seen = Rc::new(Cell::new(0usize));
                let counter = Rc::clone(&seen);
                let _sub = list.subscribe(move |c: &ChangeSet<u64>| {
                    counter.set(counter.get() + c.len());
                });
                for i in 0..count {
                    list.add(i);
                }
                black_box(seen.get())
            })
        });

        group.bench_with_input(BenchmarkId::new("batched", count), &count, |b, &count| {
            b.iter(|| {
                let mut list = ObservableList::new();
                list.add_range(0..count);
                black_box(list.len())
            })
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 2. Ranged removal from the front
// ---------------------------------------------------------------------------

fn bench_remove_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("list/remove_range");

    for count in [1_000u64, 10_000] {
        let base: ObservableList<u64> = (0..count).collect();
        group.throughput(Throughput::Elements(count));

        group.bench_with_input(BenchmarkId::new("chunks_of_16", count), &base, |b, base| {
            b.iter(|| {
                let mut list = base.clone();
                while list.len() >= 16 {
                    black_box(list.remove_range(0, 16).ok());
                }
                black_box(list.len())
            })
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 3. Bounded list churn
// ---------------------------------------------------------------------------

fn bench_cache_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache/list_churn");
    let ops = 10_000u64;
    group.throughput(Throughput::Elements(ops));

    for limit in [64usize, 1_024] {
        for end in [TrimEnd::Start, TrimEnd::End] {
            let id = format!("{limit}/{end:?}");
            group.bench_function(BenchmarkId::new("add", id), |b| {
                b.iter(|| {
                    let config = EvictionConfig::default().with_limit(limit).with_trim_end(end);
                    let mut cache = CachingList::with_config(config);
                    for i in 0..ops {
                        cache.add(i);
                    }
                    black_box(cache.len())
                })
            });
        }
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 4. Map insertion and eviction
// ---------------------------------------------------------------------------

fn bench_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map");

    for count in [1_000u64, 10_000] {
        let ks = keys(count);
        group.throughput(Throughput::Elements(count));

        group.bench_with_input(BenchmarkId::new("add", count), &ks, |b, ks| {
            b.iter(|| {
                let mut map = ObservableMap::with_capacity(ks.len());
                for k in ks {
                    let _ = map.add(*k, *k);
                }
                black_box(map.len())
            })
        });

        group.bench_with_input(BenchmarkId::new("caching_add_evict", count), &ks, |b, ks| {
            b.iter(|| {
                let mut cache = CachingMap::with_limit(256);
                for k in ks {
                    let _ = cache.add(*k, *k);
                }
                black_box(cache.len())
            })
        });

        // Remove and re-add under a limit: exercises stale ledger records.
        group.bench_with_input(BenchmarkId::new("caching_remove_readd", count), &ks, |b, ks| {
            b.iter(|| {
                let mut cache = CachingMap::with_limit(256);
                for k in ks.iter().take(256) {
                    let _ = cache.add(*k, 0u64);
                }
                for (i, k) in ks.iter().take(256).cycle().take(ks.len()).enumerate() {
                    let _ = cache.remove(k);
                    let _ = cache.add(*k, i as u64);
                }
                black_box(cache.len())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_append,
    bench_remove_range,
    bench_cache_churn,
    bench_map
);
criterion_main!(benches);
