//! Entity storage benchmarks.
//!
//! Measures the cost of the core operations: type-key resolution, component
//! add/get churn, observer fan-out, and roster iteration and lookup.
//!
//! Run with: `cargo bench --bench entity_benchmarks`

use std::cell::Cell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use brume_entity::prelude::*;

// ---------------------------------------------------------------------------
// Benchmark component types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Health(u32);

// ---------------------------------------------------------------------------
// Benchmark 1: TypeKey resolution
// ---------------------------------------------------------------------------

fn bench_key_resolution(c: &mut Criterion) {
    c.bench_function("type_key_of", |b| {
        b.iter(|| black_box(TypeKey::of::<Position>()));
    });
}

// ---------------------------------------------------------------------------
// Benchmark 2: Component add/get churn
// ---------------------------------------------------------------------------

fn bench_add_get_churn(c: &mut Criterion) {
    let mut entity = Entity::named("bench");
    let mut tick = 0u32;

    c.bench_function("add_replace_then_get", |b| {
        b.iter(|| {
            tick = tick.wrapping_add(1);
            entity.add(Health(tick));
            black_box(entity.get::<Health>());
        });
    });
}

fn bench_get_hit_and_miss(c: &mut Criterion) {
    let mut entity = Entity::named("bench");
    entity.add(Position { x: 1.0, y: 2.0 });

    c.bench_function("get_hit", |b| {
        b.iter(|| black_box(entity.get::<Position>()));
    });
    c.bench_function("get_miss", |b| {
        b.iter(|| black_box(entity.get::<Velocity>()));
    });
}

// ---------------------------------------------------------------------------
// Benchmark 3: Observer fan-out on component replacement
// ---------------------------------------------------------------------------

fn bench_observer_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("observer_fanout");

    for &count in &[0usize, 1, 8, 64] {
        let mut entity = Entity::named("bench");
        let hits = Rc::new(Cell::new(0u64));
        for _ in 0..count {
            let hits = Rc::clone(&hits);
            entity.observe(move |_, _| hits.set(hits.get() + 1));
        }
        entity.add(Health(0));

        let mut tick = 0u32;
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &_count| {
            b.iter(|| {
                tick = tick.wrapping_add(1);
                // Each replacement dispatches a removal and an addition.
                entity.add(Health(tick));
            });
        });
        black_box(hits.get());
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark 4: Roster iteration and name lookup
// ---------------------------------------------------------------------------

fn populated_roster(count: u32) -> EntityRoster {
    let mut roster = EntityRoster::new();
    for i in 0..count {
        roster
            .add(
                Entity::named(format!("unit-{i}"))
                    .with(Position {
                        x: i as f32,
                        y: 0.0,
                    })
                    .with(Health(i)),
            )
            .ok()
            .expect("bench names are unique");
    }
    roster
}

fn bench_roster_iteration(c: &mut Criterion) {
    let roster = populated_roster(1_000);

    c.bench_function("roster_iter_1k", |b| {
        b.iter(|| {
            let total: usize = roster.iter().map(Entity::len).sum();
            black_box(total);
        });
    });
}

fn bench_roster_lookup(c: &mut Criterion) {
    let roster = populated_roster(1_000);

    c.bench_function("roster_get_by_name_1k", |b| {
        b.iter(|| black_box(roster.get("unit-500")));
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_key_resolution,
    bench_add_get_churn,
    bench_get_hit_and_miss,
    bench_observer_fanout,
    bench_roster_iteration,
    bench_roster_lookup,
);
criterion_main!(benches);
