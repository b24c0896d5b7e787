//! Per-type obstacle statistics for a terminal route.

use std::collections::{BTreeMap, BTreeSet};

use geo::{Coord, Rect};
use wayfriend_core::{ObstacleStats, ObstacleStore, ObstacleStoreError};

use crate::encounter::check_encounters;

/// Statistics for every originally requested obstacle type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsReport {
    /// Counts keyed by every original avoid type.
    pub obstacle_stats: BTreeMap<String, ObstacleStats>,
    /// Types with at least one obstacle within the radius of the route.
    pub risk_factors: BTreeSet<String>,
}

impl StatsReport {
    /// Zero counts for every type in `original_types` and no risk factors.
    #[must_use]
    pub fn zeroed(original_types: &BTreeSet<String>) -> Self {
        Self {
            obstacle_stats: original_types
                .iter()
                .map(|kind| (kind.clone(), ObstacleStats::default()))
                .collect(),
            risk_factors: BTreeSet::new(),
        }
    }
}

/// Count, for each type in `original_types`, how many obstacles in `bbox`
/// the route kept clear of and how many it passed within `radius_m` of.
///
/// The bounding box is the request's, not the radius around the route, so
/// `total` reflects every obstacle of the type in the routed area.
///
/// # Errors
/// Propagates failures from `store`.
pub fn compute_stats<S>(
    route: &[Coord<f64>],
    original_types: &BTreeSet<String>,
    bbox: &Rect<f64>,
    radius_m: f64,
    segment_samples: u32,
    store: &S,
) -> Result<StatsReport, ObstacleStoreError>
where
    S: ObstacleStore + ?Sized,
{
    if original_types.is_empty() {
        return Ok(StatsReport::default());
    }

    let mut obstacles = store.query(original_types, bbox)?;
    obstacles.retain(|obstacle| original_types.contains(&obstacle.kind));
    let encounters = check_encounters(route, &obstacles, radius_m, segment_samples);

    let mut report = StatsReport::default();
    for kind in original_types {
        let counts = encounters.type_counts.get(kind).copied().unwrap_or_default();
        let stats = ObstacleStats::from_counts(counts.total, counts.hit);
        if stats.failed > 0 {
            report.risk_factors.insert(kind.clone());
        }
        report.obstacle_stats.insert(kind.clone(), stats);
    }
    Ok(report)
}
