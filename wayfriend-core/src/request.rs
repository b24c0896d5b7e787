//! Avoidance-aware routing requests and their validation.

use std::collections::{BTreeMap, BTreeSet};

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default proximity radius in metres within which an obstacle counts as
/// touching a route.
pub const DEFAULT_RADIUS_M: f64 = 3.0;

/// Penalties applied when a request does not supply its own table.
///
/// Costs are in metres of equivalent walking distance.
pub const DEFAULT_PENALTIES: [(&str, f64); 5] = [
    ("curb", 1000.0),
    ("bollard", 300.0),
    ("crosswalk", 150.0),
    ("slope", 500.0),
    ("stairs", 3000.0),
];

fn default_radius() -> f64 {
    DEFAULT_RADIUS_M
}

/// Build the default penalty table as an owned map.
#[must_use]
pub fn default_penalties() -> BTreeMap<String, f64> {
    DEFAULT_PENALTIES
        .iter()
        .map(|(kind, cost)| ((*kind).to_owned(), *cost))
        .collect()
}

/// Parameters for a route search that avoids obstacle types.
///
/// `avoid_types` is a set, so duplicate tags collapse. Types missing from
/// `penalties` are still requested but weigh nothing during the search; the
/// router logs a warning for each of them. When `penalties` is omitted from
/// serialised input the [`DEFAULT_PENALTIES`] table is used.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use wayfriend_core::AvoidanceRequest;
///
/// let request = AvoidanceRequest::new(
///     Coord { x: 126.650, y: 37.370 },
///     Coord { x: 126.655, y: 37.372 },
/// )
/// .with_avoid_types(["stairs", "curb"]);
///
/// assert!(request.validate().is_ok());
/// assert_eq!(request.penalty_for("stairs"), 3000.0);
/// assert_eq!(request.radius_m, 3.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceRequest {
    /// Requested start coordinate.
    pub start: Coord<f64>,
    /// Requested end coordinate.
    pub end: Coord<f64>,
    /// Obstacle types the caller wants to avoid.
    #[serde(default)]
    pub avoid_types: BTreeSet<String>,
    /// Proximity radius in metres; must be positive.
    #[serde(default = "default_radius")]
    pub radius_m: f64,
    /// Additive edge cost per obstacle type.
    #[serde(default = "default_penalties")]
    pub penalties: BTreeMap<String, f64>,
}

/// Validation errors for [`AvoidanceRequest`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AvoidanceRequestValidationError {
    /// A coordinate was NaN, infinite, or outside WGS84 ranges.
    #[error("{field} coordinate ({x}, {y}) is not a valid WGS84 position")]
    InvalidCoordinate {
        /// Either `"start"` or `"end"`.
        field: &'static str,
        /// Longitude supplied.
        x: f64,
        /// Latitude supplied.
        y: f64,
    },
    /// The radius was zero, negative, or not finite.
    #[error("radius_m must be a positive finite number, got {0}")]
    NonPositiveRadius(f64),
    /// A penalty was negative or not finite.
    #[error("penalty for {kind:?} must be a non-negative finite number, got {value}")]
    InvalidPenalty {
        /// Obstacle type carrying the bad penalty.
        kind: String,
        /// Supplied value.
        value: f64,
    },
    /// An avoid type was the empty string.
    #[error("avoid types must not contain empty names")]
    EmptyAvoidType,
    /// Start and end are too far apart to load a bounded graph.
    #[error("route span of {span_deg:.4} degrees exceeds the limit of {max_deg:.4}")]
    SpanTooLarge {
        /// Largest of the lon/lat extents between start and end.
        span_deg: f64,
        /// Configured limit.
        max_deg: f64,
    },
}

impl AvoidanceRequest {
    /// Construct a request with no avoid types, the default radius and the
    /// default penalty table.
    #[must_use]
    pub fn new(start: Coord<f64>, end: Coord<f64>) -> Self {
        Self {
            start,
            end,
            avoid_types: BTreeSet::new(),
            radius_m: DEFAULT_RADIUS_M,
            penalties: default_penalties(),
        }
    }

    /// Replace the avoid set.
    #[must_use]
    pub fn with_avoid_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.avoid_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the proximity radius.
    #[must_use]
    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    /// Replace the penalty table.
    #[must_use]
    pub fn with_penalties<I, T>(mut self, penalties: I) -> Self
    where
        I: IntoIterator<Item = (T, f64)>,
        T: Into<String>,
    {
        self.penalties = penalties
            .into_iter()
            .map(|(kind, cost)| (kind.into(), cost))
            .collect();
        self
    }

    /// Penalty for `kind`, or `0.0` when the table has no entry.
    #[must_use]
    pub fn penalty_for(&self, kind: &str) -> f64 {
        self.penalties.get(kind).copied().unwrap_or(0.0)
    }

    /// Requested types that have no entry in the penalty table.
    pub fn unpenalised_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.avoid_types
            .iter()
            .filter(|kind| !self.penalties.contains_key(kind.as_str()))
            .map(String::as_str)
    }

    /// Largest of the longitude and latitude extents between start and end.
    #[must_use]
    pub fn span_deg(&self) -> f64 {
        let dx = (self.start.x - self.end.x).abs();
        let dy = (self.start.y - self.end.y).abs();
        dx.max(dy)
    }

    /// Validate coordinates, radius, penalties and avoid type names.
    pub fn validate(&self) -> Result<(), AvoidanceRequestValidationError> {
        validate_coord("start", self.start)?;
        validate_coord("end", self.end)?;
        if !(self.radius_m.is_finite() && self.radius_m > 0.0) {
            return Err(AvoidanceRequestValidationError::NonPositiveRadius(
                self.radius_m,
            ));
        }
        if let Some((kind, value)) = self
            .penalties
            .iter()
            .find(|(_, value)| !(value.is_finite() && **value >= 0.0))
        {
            return Err(AvoidanceRequestValidationError::InvalidPenalty {
                kind: kind.clone(),
                value: *value,
            });
        }
        if self.avoid_types.iter().any(|kind| kind.trim().is_empty()) {
            return Err(AvoidanceRequestValidationError::EmptyAvoidType);
        }
        Ok(())
    }

    /// Validate the request and additionally bound the start/end span.
    pub fn validate_with_span(
        &self,
        max_span_deg: f64,
    ) -> Result<(), AvoidanceRequestValidationError> {
        self.validate()?;
        let span_deg = self.span_deg();
        if span_deg > max_span_deg {
            return Err(AvoidanceRequestValidationError::SpanTooLarge {
                span_deg,
                max_deg: max_span_deg,
            });
        }
        Ok(())
    }
}

fn validate_coord(
    field: &'static str,
    coord: Coord<f64>,
) -> Result<(), AvoidanceRequestValidationError> {
    let valid = coord.x.is_finite()
        && coord.y.is_finite()
        && (-180.0..=180.0).contains(&coord.x)
        && (-90.0..=90.0).contains(&coord.y);
    if valid {
        Ok(())
    } else {
        Err(AvoidanceRequestValidationError::InvalidCoordinate {
            field,
            x: coord.x,
            y: coord.y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn request() -> AvoidanceRequest {
        AvoidanceRequest::new(Coord { x: 126.65, y: 37.37 }, Coord { x: 126.66, y: 37.38 })
            .with_avoid_types(["stairs"])
    }

    #[rstest]
    fn accepts_well_formed_request(request: AvoidanceRequest) {
        assert_eq!(request.validate(), Ok(()));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_non_positive_radius(request: AvoidanceRequest, #[case] radius: f64) {
        let err = request
            .with_radius(radius)
            .validate()
            .expect_err("radius should be rejected");
        assert!(matches!(err, AvoidanceRequestValidationError::NonPositiveRadius(_)));
    }

    #[rstest]
    #[case(Coord { x: 181.0, y: 0.0 })]
    #[case(Coord { x: 0.0, y: -90.5 })]
    #[case(Coord { x: f64::NAN, y: 0.0 })]
    fn rejects_invalid_start(mut request: AvoidanceRequest, #[case] start: Coord<f64>) {
        request.start = start;
        let err = request.validate().expect_err("coordinate should be rejected");
        assert!(matches!(
            err,
            AvoidanceRequestValidationError::InvalidCoordinate { field: "start", .. }
        ));
    }

    #[rstest]
    fn rejects_negative_penalty(request: AvoidanceRequest) {
        let err = request
            .with_penalties([("stairs", -5.0)])
            .validate()
            .expect_err("negative penalty should be rejected");
        assert!(matches!(
            err,
            AvoidanceRequestValidationError::InvalidPenalty { ref kind, .. } if kind == "stairs"
        ));
    }

    #[rstest]
    fn rejects_blank_avoid_type(request: AvoidanceRequest) {
        let err = request
            .with_avoid_types(["stairs", " "])
            .validate()
            .expect_err("blank type should be rejected");
        assert_eq!(err, AvoidanceRequestValidationError::EmptyAvoidType);
    }

    #[rstest]
    fn rejects_span_over_limit(request: AvoidanceRequest) {
        let err = request
            .validate_with_span(0.005)
            .expect_err("span should be rejected");
        assert!(matches!(err, AvoidanceRequestValidationError::SpanTooLarge { .. }));
    }

    #[rstest]
    fn missing_penalty_entry_weighs_nothing(request: AvoidanceRequest) {
        let request = request
            .with_avoid_types(["stairs", "ramp"])
            .with_penalties([("stairs", 10.0)]);
        assert_eq!(request.penalty_for("ramp"), 0.0);
        assert_eq!(request.unpenalised_types().collect::<Vec<_>>(), vec!["ramp"]);
    }

    #[rstest]
    fn deserialisation_fills_defaults() {
        let json = r#"{
            "start": {"x": 126.65, "y": 37.37},
            "end": {"x": 126.66, "y": 37.38},
            "avoid_types": ["curb", "curb", "stairs"]
        }"#;
        let request: AvoidanceRequest = serde_json::from_str(json).expect("valid request");
        assert_eq!(request.avoid_types.len(), 2);
        assert_eq!(request.radius_m, DEFAULT_RADIUS_M);
        assert_eq!(request.penalties, default_penalties());
    }
}
