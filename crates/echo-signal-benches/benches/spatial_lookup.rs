// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
// criterion_group!/criterion_main! expand to undocumented functions that cannot
// carry #[allow] (attributes on macro invocations are ignored). Crate-level
// suppress is required for benchmark binaries using Criterion.
#![allow(missing_docs)]
//! Spatial index and hash table microbenchmarks.
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use echo_signal::{Handle, OpenAddressingHashTable, SpatialCellKey, SpatialIndex};

fn bench_index_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_add");
    for &n in &[256u64, 4_096, 65_536] {
        group.throughput(Throughput::Elements(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut index = SpatialIndex::new(16);
                for raw in 1..=n {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    let key = SpatialCellKey::from_cell((raw % 97) as i32, (raw % 13) as i32, 0);
                    if let Some(h) = Handle::new(raw) {
                        let _ = index.add(h, key);
                    }
                }
                criterion::black_box(index.cell_count())
            });
        });
    }
    group.finish();
}

fn bench_table_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_find");
    for &n in &[1_024u64, 16_384] {
        let mut table: OpenAddressingHashTable<u64, u64> = OpenAddressingHashTable::new();
        for k in 1..=n {
            let _ = table.insert(k.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1, k);
        }
        group.throughput(Throughput::Elements(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut hits = 0u64;
                for k in 1..=n {
                    if table.exists(k.wrapping_mul(0x9e37_79b9_7f4a_7c15) | 1) {
                        hits += 1;
                    }
                }
                criterion::black_box(hits)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_index_add, bench_table_find);
criterion_main!(benches);
