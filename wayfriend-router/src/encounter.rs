//! Detect obstacles a route passes close to.
//!
//! Proximity is approximated by sampling: an obstacle touches a segment when
//! it lies within the radius of either endpoint or of one of a fixed number
//! of evenly spaced interior points. More samples trade time for accuracy;
//! obstacles near a long segment but between two samples can be missed.

use std::collections::BTreeMap;

use geo::Coord;
use wayfriend_core::Obstacle;
use wayfriend_core::distance::{haversine_m, interpolate};

/// Obstacles of one type checked against a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCount {
    /// Obstacles of the type that were checked.
    pub total: u32,
    /// Obstacles of the type within the radius of the route.
    pub hit: u32,
}

/// Obstacles found within the radius of a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncounterReport {
    /// Ids of hit obstacles, in input order.
    pub hits: Vec<u64>,
    /// Checked and hit counts for every obstacle type seen in the input.
    pub type_counts: BTreeMap<String, TypeCount>,
}

impl EncounterReport {
    /// Hit count for `kind`, zero when none were hit.
    #[must_use]
    pub fn count_for(&self, kind: &str) -> u32 {
        self.type_counts
            .get(kind)
            .map(|counts| counts.hit)
            .unwrap_or_default()
    }
}

/// Check every obstacle against `route`.
///
/// A single-point route checks that point alone; an empty route hits
/// nothing but still counts every obstacle towards its type's total.
#[must_use]
pub fn check_encounters(
    route: &[Coord<f64>],
    obstacles: &[Obstacle],
    radius_m: f64,
    segment_samples: u32,
) -> EncounterReport {
    let mut report = EncounterReport::default();
    for obstacle in obstacles {
        let counts = report.type_counts.entry(obstacle.kind.clone()).or_default();
        counts.total = counts.total.saturating_add(1);
        if touches_route(route, obstacle.location, radius_m, segment_samples) {
            counts.hit = counts.hit.saturating_add(1);
            report.hits.push(obstacle.id);
        }
    }
    report
}

/// Whether `point` lies within `radius_m` of `route` at any sampled position.
#[must_use]
pub fn touches_route(
    route: &[Coord<f64>],
    point: Coord<f64>,
    radius_m: f64,
    segment_samples: u32,
) -> bool {
    let near = |at: Coord<f64>| haversine_m(at, point) <= radius_m;
    match route {
        [] => false,
        [only] => near(*only),
        _ => route.windows(2).any(|pair| match pair {
            [a, b] => segment_samples_iter(*a, *b, segment_samples).any(near),
            _ => false,
        }),
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "sample fractions divide the segment evenly"
)]
fn segment_samples_iter(
    a: Coord<f64>,
    b: Coord<f64>,
    samples: u32,
) -> impl Iterator<Item = Coord<f64>> {
    let divisions = f64::from(samples) + 1.0;
    [a, b]
        .into_iter()
        .chain((1..=samples).map(move |i| interpolate(a, b, f64::from(i) / divisions)))
}
