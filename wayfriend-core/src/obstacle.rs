use chrono::{DateTime, Utc};
use geo::Coord;
use rstar::{AABB, RTreeObject};
use serde::{Deserialize, Serialize};

/// A detected obstruction on the walking network.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`. The `kind`
/// is a free-form type tag such as `"curb"` or `"stairs"`; avoidance requests
/// refer to obstacles by this tag.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use wayfriend_core::Obstacle;
///
/// let obstacle = Obstacle::new(7, "stairs", Coord { x: 126.65, y: 37.37 });
/// assert_eq!(obstacle.kind, "stairs");
/// assert!(obstacle.confidence.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Identifier assigned by the obstacle store.
    pub id: u64,
    /// Obstacle type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Geospatial position.
    pub location: Coord<f64>,
    /// Detector confidence in `0.0..=1.0`, when known.
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Detection time, when known.
    #[serde(default)]
    pub detected_at: Option<DateTime<Utc>>,
}

impl Obstacle {
    /// Construct an obstacle without detection metadata.
    pub fn new(id: u64, kind: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            id,
            kind: kind.into(),
            location,
            confidence: None,
            detected_at: None,
        }
    }

    /// Attach a detector confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Attach a detection timestamp.
    #[must_use]
    pub fn with_detected_at(mut self, detected_at: DateTime<Utc>) -> Self {
        self.detected_at = Some(detected_at);
        self
    }
}

impl RTreeObject for Obstacle {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.x, self.location.y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    fn builder_attaches_metadata() {
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 9, 30, 0).single();
        let obstacle = Obstacle::new(1, "curb", Coord { x: 0.0, y: 0.0 }).with_confidence(0.9);
        let obstacle = match at {
            Some(ts) => obstacle.with_detected_at(ts),
            None => obstacle,
        };
        assert_eq!(obstacle.confidence, Some(0.9));
        assert_eq!(obstacle.detected_at, at);
    }

    #[rstest]
    fn deserialises_type_field_without_metadata() {
        let json = r#"{"id":3,"type":"bollard","location":{"x":1.0,"y":2.0}}"#;
        let obstacle: Obstacle = serde_json::from_str(json).expect("valid obstacle JSON");
        assert_eq!(obstacle, Obstacle::new(3, "bollard", Coord { x: 1.0, y: 2.0 }));
    }
}
