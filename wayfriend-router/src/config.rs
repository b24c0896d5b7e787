//! Tunables for [`AvoidanceRouter`](crate::AvoidanceRouter).

use wayfriend_core::NetworkType;
use wayfriend_core::distance::DEFAULT_BBOX_MARGIN_DEG;

/// Extra cost, in metres, added to edges on motor-vehicle road classes.
pub const DEFAULT_VEHICULAR_PENALTY: f64 = 10_000.0;

/// Interior sample points checked per route segment.
pub const DEFAULT_SEGMENT_SAMPLES: u32 = 3;

/// Largest lon/lat extent between start and end accepted by the router.
pub const DEFAULT_MAX_SPAN_DEG: f64 = 0.2;

/// Configuration for [`AvoidanceRouter`](crate::AvoidanceRouter).
///
/// # Examples
/// ```
/// use wayfriend_router::RouterConfig;
///
/// let config = RouterConfig::default()
///     .with_segment_samples(7)
///     .with_bbox_margin_deg(0.005);
/// assert_eq!(config.segment_samples, 7);
/// assert_eq!(config.vehicular_penalty, 10_000.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterConfig {
    /// Margin in degrees added around start and end for graph and obstacle
    /// queries.
    pub bbox_margin_deg: f64,
    /// Additive cost for edges on vehicular road classes.
    pub vehicular_penalty: f64,
    /// Evenly spaced interior points sampled on each route segment by the
    /// encounter check. `3` samples the quarter points.
    pub segment_samples: u32,
    /// Requests whose start/end span exceeds this many degrees are rejected.
    pub max_span_deg: f64,
    /// Network filter passed to the graph provider.
    pub network_type: NetworkType,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            bbox_margin_deg: DEFAULT_BBOX_MARGIN_DEG,
            vehicular_penalty: DEFAULT_VEHICULAR_PENALTY,
            segment_samples: DEFAULT_SEGMENT_SAMPLES,
            max_span_deg: DEFAULT_MAX_SPAN_DEG,
            network_type: NetworkType::Walk,
        }
    }
}

impl RouterConfig {
    /// Replace the bounding-box margin.
    #[must_use]
    pub const fn with_bbox_margin_deg(mut self, margin_deg: f64) -> Self {
        self.bbox_margin_deg = margin_deg;
        self
    }

    /// Replace the vehicular road-class penalty.
    #[must_use]
    pub const fn with_vehicular_penalty(mut self, penalty: f64) -> Self {
        self.vehicular_penalty = penalty;
        self
    }

    /// Replace the number of interior samples per segment.
    #[must_use]
    pub const fn with_segment_samples(mut self, samples: u32) -> Self {
        self.segment_samples = samples;
        self
    }

    /// Replace the maximum start/end span.
    #[must_use]
    pub const fn with_max_span_deg(mut self, span_deg: f64) -> Self {
        self.max_span_deg = span_deg;
        self
    }

    /// Replace the network filter.
    #[must_use]
    pub const fn with_network_type(mut self, network_type: NetworkType) -> Self {
        self.network_type = network_type;
        self
    }
}
