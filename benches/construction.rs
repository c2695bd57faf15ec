extern crate dumpgraph;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dumpgraph::prelude::*;
use std::hint::black_box;

const MODULE: Address = Address(0x7ff8_1000_0000);

/// A heap of `objects` nodes, each referencing its four successors.
fn synthetic_heap(objects: u64) -> SyntheticSnapshot {
    let mut snapshot = SyntheticSnapshot::new();
    snapshot.add_module(ModuleDescriptor::new(MODULE, "Contoso.dll"), &[]);

    let keys: Vec<DumpTypeKey> = (0..8u64)
        .map(|i| DumpTypeKey::new(0x1000 + i * 0x10, format!("Contoso.Node{i}")))
        .collect();
    for key in &keys {
        snapshot.add_type(MODULE, TypeDescriptor::new(key.method_table, key.name.clone()));
    }

    for i in 0..objects {
        let address = Address(0x0250_0000_0000 + i * 0x30);
        snapshot.add_object(ObjectDescriptor::new(address, &keys[(i % 8) as usize], 48));
        for step in 1..=4 {
            let target = (i + step * 7) % objects;
            snapshot.add_reference(address, Address(0x0250_0000_0000 + target * 0x30));
        }
    }

    snapshot
}

/// Full construction, parallel and sequential linking
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for objects in [10_000u64, 100_000] {
        let snapshot = synthetic_heap(objects);
        group.throughput(Throughput::Elements(objects));

        for (name, config) in [
            ("parallel", BuildConfig::default()),
            ("sequential", BuildConfig::sequential()),
        ] {
            group.bench_with_input(BenchmarkId::new(name, objects), &snapshot, |b, snapshot| {
                b.iter(|| {
                    let repos = RepositoryFactory::new(snapshot)
                        .with_config(config)
                        .build()
                        .unwrap();
                    black_box(repos.stats())
                });
            });
        }
    }

    group.finish();
}

/// Lookups and traversal on a finished graph
fn bench_queries(c: &mut Criterion) {
    let snapshot = synthetic_heap(100_000);
    let repos = RepositoryFactory::new(&snapshot).build().unwrap();

    c.bench_function("get_object", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i = (i + 7919) % 100_000;
            black_box(repos.get_object(Address(0x0250_0000_0000 + i * 0x30)).unwrap())
        });
    });

    c.bench_function("iterate_objects", |b| {
        b.iter(|| black_box(repos.objects().objects().map(|o| o.reference_count()).sum::<usize>()));
    });
}

criterion_group!(benches, bench_build, bench_queries);
criterion_main!(benches);
