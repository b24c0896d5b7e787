//! Routes produced by the avoidance router and their per-type statistics.

use std::collections::{BTreeMap, BTreeSet};

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Per-type obstacle counts measured against a final route.
///
/// `total` counts obstacles of the type inside the request's bounding box;
/// `failed` counts those within the avoidance radius of the route and
/// `success` the remainder, so `total == success + failed` always holds.
///
/// # Examples
/// ```
/// use wayfriend_core::ObstacleStats;
///
/// let stats = ObstacleStats::from_counts(5, 2);
/// assert_eq!(stats.success, 3);
/// assert!(stats.is_consistent());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleStats {
    /// Obstacles of this type in scope.
    pub total: u32,
    /// Obstacles kept clear of the route.
    pub success: u32,
    /// Obstacles the route passes within the radius of.
    pub failed: u32,
}

impl ObstacleStats {
    /// Build stats from a total and a hit count.
    ///
    /// Hits above `total` are clamped to `total`.
    #[must_use]
    pub fn from_counts(total: u32, hits: u32) -> Self {
        let failed = hits.min(total);
        Self {
            total,
            success: total - failed,
            failed,
        }
    }

    /// Whether `total == success + failed`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.success.checked_add(self.failed) == Some(self.total)
    }
}

/// Outcome of an avoidance route search.
///
/// `route` runs from the graph node nearest the requested start to the node
/// nearest the requested end, except for the straight-line fallback which
/// uses the raw requested coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Route polyline; `x = longitude`, `y = latitude`.
    pub route: Vec<Coord<f64>>,
    /// Sum of traversed edge lengths in metres, without penalties.
    pub distance_m: f64,
    /// Requested types still encountered on the final route.
    pub risk_factors: BTreeSet<String>,
    /// Requested types still weighted when the search terminated.
    pub avoided_final: BTreeSet<String>,
    /// Per-type counts keyed by every originally requested type.
    pub obstacle_stats: BTreeMap<String, ObstacleStats>,
}
