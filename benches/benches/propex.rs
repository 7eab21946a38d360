// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_propex`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;

use understory_propex::{
    AtomicNode, ByValue, DefaultKey, ExclusiveRegistry, ExternalNode, KeyTraits, OwnedNode,
    PropertyView, SharedNode, SharedView, shared_cell,
};

fn bench_node_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("propex/node");

    let mut owned = OwnedNode::new(1.0_f64);
    group.bench_function("owned_get_set", |b| {
        b.iter(|| {
            let v = *owned.get().unwrap();
            owned.set(black_box(v + 1.0)).unwrap();
        });
    });

    let cell = shared_cell(1.0_f64);
    let mut external = ExternalNode::new(&cell);
    group.bench_function("external_get_set", |b| {
        b.iter(|| {
            let v = *external.get().unwrap();
            external.set(black_box(v + 1.0)).unwrap();
        });
    });

    let first = SharedNode::new(1.0_f64);
    let mut second = SharedNode::<f64>::new(Arc::clone(first.handle()));
    group.bench_function("shared_get_set", |b| {
        b.iter(|| {
            let v = *second.get().unwrap();
            second.set(black_box(v + 1.0)).unwrap();
        });
    });
    black_box(first);

    let atomic = AtomicNode::new(1.0_f64);
    group.bench_function("atomic_load_store", |b| {
        b.iter(|| {
            let v = atomic.load();
            atomic.store(black_box(v + 1.0));
        });
    });

    group.finish();
}

fn bench_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("propex/view");

    let mut node = OwnedNode::new(0_u64);
    group.bench_function("checked", |b| {
        let mut view = PropertyView::new(&mut node);
        b.iter(|| {
            let v = *view.get_checked().unwrap();
            view.set_checked(black_box(v.wrapping_add(1))).unwrap();
        });
    });

    group.bench_function("unchecked", |b| {
        let mut view = PropertyView::new(&mut node);
        b.iter(|| {
            let v = *view.get().unwrap();
            view.set(black_box(v.wrapping_add(1))).unwrap();
        });
    });

    let shared = SharedNode::new(0_u64);
    group.bench_function("shared", |b| {
        let reader = SharedView::new(&shared);
        let writer = SharedView::new(&shared);
        b.iter(|| {
            let v = *reader.get().unwrap();
            writer.set(black_box(v.wrapping_add(1))).unwrap();
        });
    });

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("propex/registry");

    for len in [16_usize, 256, 4_096] {
        let mut reg = ExclusiveRegistry::new();
        for i in 0..len {
            reg.add_node(OwnedNode::new(i), (format!("obj{i}"), "value"));
        }
        let lookup = format!("obj{}:value", len / 2);

        group.bench_with_input(BenchmarkId::new("find", len), &lookup, |b, lookup| {
            b.iter(|| black_box(reg.find(lookup)));
        });

        group.bench_with_input(BenchmarkId::new("typed_node", len), &lookup, |b, lookup| {
            b.iter(|| black_box(*reg.node::<ByValue<usize>>(lookup).unwrap().get().unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("add_merged", len), &len, |b, &len| {
            b.iter_batched(
                ExclusiveRegistry::new,
                |mut reg| {
                    for i in 0..len {
                        reg.add_node(OwnedNode::new(i), ("obj", "value"));
                    }
                    black_box(reg);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.bench_function("key_merge_split", |b| {
        b.iter(|| {
            let key = DefaultKey::merge(black_box(["scene", "camera", "fov"]));
            black_box(DefaultKey::split(&key).len())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_node_access, bench_view, bench_registry);
criterion_main!(benches);
