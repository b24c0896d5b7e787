//! Criterion benchmarks for the avoidance router.
//!
//! Measures `find_route` on square lattices of increasing size with a
//! deterministic scatter of obstacles, so relaxation rounds are exercised.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package wayfriend-router
//! ```

// Criterion macros generate code that triggers missing_docs warnings.
#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]
#![expect(
    clippy::float_arithmetic,
    reason = "benchmark geometry is expressed in floating-point degrees"
)]
#![expect(
    clippy::expect_used,
    reason = "benchmarks abort on routing failures"
)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use geo::Coord;
use wayfriend_core::test_support::{FixedGraphProvider, MemoryObstacleStore, grid_graph};
use wayfriend_core::{AvoidanceRequest, Obstacle, Router};
use wayfriend_router::AvoidanceRouter;

/// Lattice side lengths to benchmark.
const GRID_SIDES: &[u64] = &[10, 25, 50];

/// Spacing between lattice neighbours in degrees (about 55 m).
const SPACING: f64 = 0.0005;

const KINDS: [&str; 3] = ["curb", "stairs", "crosswalk"];

/// Place an obstacle on every third horizontal edge midpoint, cycling types.
fn scatter_obstacles(side: u64) -> Vec<Obstacle> {
    let mut obstacles = Vec::new();
    let mut id = 0_u64;
    for row in 0..side {
        for col in (0..side.saturating_sub(1)).step_by(3) {
            id += 1;
            let kind = KINDS.iter().cycle().nth(usize::try_from(id).unwrap_or(0)).copied();
            let location = Coord {
                x: (f64::from(u32::try_from(col).unwrap_or(0)) + 0.5) * SPACING,
                y: f64::from(u32::try_from(row).unwrap_or(0)) * SPACING,
            };
            obstacles.push(Obstacle::new(id, kind.unwrap_or("curb"), location));
        }
    }
    obstacles
}

fn bench_find_route(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_route");
    for side in GRID_SIDES {
        let graph = grid_graph(*side, *side, SPACING, Coord { x: 0.0, y: 0.0 });
        let store = MemoryObstacleStore::with_obstacles(scatter_obstacles(*side));
        let router = AvoidanceRouter::new(FixedGraphProvider::new(graph), store);
        let far = f64::from(u32::try_from(*side - 1).unwrap_or(0)) * SPACING;
        let request = AvoidanceRequest::new(Coord { x: 0.0, y: 0.0 }, Coord { x: far, y: far })
            .with_avoid_types(KINDS);

        group.bench_with_input(BenchmarkId::from_parameter(side), &request, |b, request| {
            b.iter(|| {
                router
                    .find_route(black_box(request))
                    .expect("routing succeeds")
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find_route);
criterion_main!(benches);
