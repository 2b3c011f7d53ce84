//! Storage benchmarks.
//!
//! Measures the hot paths of the slot-based store: view iteration against a
//! raw `Vec` baseline, single-component access, and entity churn over a
//! recycled slot space.
//!
//! Run with: `cargo bench --bench ecs_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use colonnade::prelude::*;

// ---------------------------------------------------------------------------
// Benchmark component types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Velocity {
    dx: f64,
    dy: f64,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Health(u32);

type Ecs = EcsManager<(Position, Velocity, Health)>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a store with `entity_count` entities holding Position + Velocity;
/// every other entity also gets Health.
fn setup_store(entity_count: usize) -> Ecs {
    let mut ecs = Ecs::new();
    for i in 0..entity_count {
        let e = ecs
            .create_entity_with((
                Position {
                    x: i as f64,
                    y: i as f64 * 2.0,
                },
                Velocity { dx: 1.0, dy: -1.0 },
            ))
            .unwrap();
        if i % 2 == 0 {
            ecs.add_component(e, Health(100)).unwrap();
        }
    }
    ecs
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// View iteration over two components, against a raw parallel-Vec baseline.
fn bench_view_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_iteration");

    for &count in &[1_000usize, 10_000] {
        let mut ecs = setup_store(count);

        group.bench_with_input(BenchmarkId::new("view_pos_vel", count), &count, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f64;
                for (_id, (pos, vel)) in ecs.view::<(&Position, &Velocity)>().iter() {
                    sum += pos.x * vel.dx + pos.y * vel.dy;
                }
                black_box(sum)
            });
        });

        group.bench_with_input(
            BenchmarkId::new("view_mut_pos_vel", count),
            &count,
            |b, _| {
                b.iter(|| {
                    for (_id, (pos, vel)) in &mut ecs.view_mut::<(&mut Position, &Velocity)>() {
                        pos.x += vel.dx;
                        pos.y += vel.dy;
                    }
                });
            },
        );

        // Raw parallel Vecs are the upper bound the slot layout aims at.
        let positions: Vec<Position> = (0..count)
            .map(|i| Position {
                x: i as f64,
                y: i as f64 * 2.0,
            })
            .collect();
        let velocities: Vec<Velocity> = vec![Velocity { dx: 1.0, dy: -1.0 }; count];
        group.bench_with_input(BenchmarkId::new("raw_vec_baseline", count), &count, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f64;
                for (pos, vel) in positions.iter().zip(&velocities) {
                    sum += pos.x * vel.dx + pos.y * vel.dy;
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

/// Partitioned iteration: the per-part overhead of splitting the slot space.
fn bench_partitioned_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("partitioned_views");
    let mut ecs = setup_store(10_000);

    for &parts in &[1usize, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(parts), &parts, |b, &parts| {
            b.iter(|| {
                for part in ecs.view_parts_mut::<(&mut Position, &Velocity)>(parts) {
                    for (_id, (pos, vel)) in part {
                        pos.x += vel.dx;
                        pos.y += vel.dy;
                    }
                }
            });
        });
    }

    group.finish();
}

/// Direct component access through an entity handle.
fn bench_component_access(c: &mut Criterion) {
    let ecs = setup_store(10_000);
    let handles: Vec<EntityId> = ecs.records().map(|r| r.id).collect();

    c.bench_function("get_component_10k", |b| {
        b.iter(|| {
            let mut sum = 0.0f64;
            for &e in &handles {
                sum += ecs.get_component::<Position>(e).unwrap().x;
            }
            black_box(sum)
        });
    });
}

/// Create/remove churn over a bounded slot space: every removal frees the
/// slot the next creation reuses.
fn bench_entity_churn(c: &mut Criterion) {
    c.bench_function("churn_bounded_1k", |b| {
        let mut ecs = EcsManager::<(Position, Velocity, Health)>::bounded(1_000);
        let mut handles: Vec<EntityId> = (0..1_000)
            .map(|_| ecs.create_entity().unwrap())
            .collect();

        b.iter(|| {
            for _ in 0..100 {
                let e = handles.pop().unwrap();
                ecs.remove_entity(e).unwrap();
                handles.push(ecs.create_entity().unwrap());
            }
        });
    });
}

criterion_group!(
    benches,
    bench_view_iteration,
    bench_partitioned_views,
    bench_component_access,
    bench_entity_churn
);
criterion_main!(benches);
