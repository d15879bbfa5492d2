//! Spatial index and step throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use battle_sim::core::quadtree::{Bounds, QuadTree};
use battle_sim::core::vec2::Vec2;
use battle_sim::game::Scenario;

fn random_points(count: usize, half: f32) -> Vec<Vec2> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| Vec2::new(rng.gen_range(-half..half), rng.gen_range(-half..half)))
        .collect()
}

fn bench_rebuild(c: &mut Criterion) {
    let points = random_points(5_000, 500.0);
    let bounds = Bounds::around(Vec2::ZERO, 512.0);

    c.bench_function("quadtree_rebuild_5k", |b| {
        let mut tree = QuadTree::new(bounds);
        b.iter(|| {
            tree.clear();
            for (i, p) in points.iter().enumerate() {
                tree.insert(p.x, p.y, i as u32);
            }
            black_box(tree.len())
        })
    });
}

fn bench_find(c: &mut Criterion) {
    let points = random_points(5_000, 500.0);
    let mut tree = QuadTree::new(Bounds::around(Vec2::ZERO, 512.0));
    for (i, p) in points.iter().enumerate() {
        tree.insert(p.x, p.y, i as u32);
    }

    c.bench_function("quadtree_find_r2_x1000", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for p in points.iter().take(1_000) {
                hits += tree.find(p.x, p.y, 2.0).count();
            }
            black_box(hits)
        })
    });
}

fn bench_steps(c: &mut Criterion) {
    let scenario = Scenario::skirmish(12345);

    c.bench_function("skirmish_60_steps", |b| {
        b.iter(|| {
            let mut sim = scenario.build().unwrap();
            for _ in 0..60 {
                sim.step();
            }
            black_box(sim.compute_hash())
        })
    });
}

criterion_group!(benches, bench_rebuild, bench_find, bench_steps);
criterion_main!(benches);
