//! Great-circle distance and small lon/lat geometry helpers.
//!
//! Coordinates are WGS84 with `x = longitude` and `y = latitude`, matching
//! the rest of the crate. Interpolation is linear in lon/lat space, which is
//! accurate enough at the street scale the router operates on.

use geo::{Coord, Distance, Haversine, Point, Rect};

/// Default margin, in degrees, added around the start and end coordinates
/// when scoping graph and obstacle queries (roughly 1.1 km of latitude).
pub const DEFAULT_BBOX_MARGIN_DEG: f64 = 0.01;

/// Great-circle distance between two coordinates in metres.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use wayfriend_core::distance::haversine_m;
///
/// let origin = Coord { x: 0.0, y: 0.0 };
/// assert_eq!(haversine_m(origin, origin), 0.0);
/// let one_degree = haversine_m(origin, Coord { x: 0.0, y: 1.0 });
/// assert!((one_degree - 111_195.0).abs() < 50.0);
/// ```
#[must_use]
pub fn haversine_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Arithmetic midpoint of two coordinates.
#[must_use]
pub fn midpoint(a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    interpolate(a, b, 0.5)
}

/// Point at fraction `t` along the straight lon/lat segment from `a` to `b`.
///
/// `t = 0.0` yields `a` and `t = 1.0` yields `b`.
#[must_use]
pub fn interpolate(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

/// Axis-aligned box enclosing `start` and `end`, grown by `margin_deg` on
/// every side.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use wayfriend_core::distance::bounding_box;
///
/// let bbox = bounding_box(Coord { x: 1.0, y: 2.0 }, Coord { x: 0.0, y: 3.0 }, 0.5);
/// assert_eq!(bbox.min(), Coord { x: -0.5, y: 1.5 });
/// assert_eq!(bbox.max(), Coord { x: 1.5, y: 3.5 });
/// ```
#[must_use]
pub fn bounding_box(start: Coord<f64>, end: Coord<f64>, margin_deg: f64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: start.x.min(end.x) - margin_deg,
            y: start.y.min(end.y) - margin_deg,
        },
        Coord {
            x: start.x.max(end.x) + margin_deg,
            y: start.y.max(end.y) + margin_deg,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn haversine_is_symmetric() {
        let a = Coord { x: 126.65, y: 37.37 };
        let b = Coord { x: 126.66, y: 37.38 };
        let forward = haversine_m(a, b);
        let backward = haversine_m(b, a);
        assert!((forward - backward).abs() < 1e-9);
        assert!(forward > 1_000.0 && forward < 1_500.0);
    }

    #[rstest]
    #[case(0.0, Coord { x: 0.0, y: 0.0 })]
    #[case(0.25, Coord { x: 1.0, y: 0.5 })]
    #[case(1.0, Coord { x: 4.0, y: 2.0 })]
    fn interpolate_walks_the_segment(#[case] t: f64, #[case] expected: Coord<f64>) {
        let point = interpolate(Coord { x: 0.0, y: 0.0 }, Coord { x: 4.0, y: 2.0 }, t);
        assert!((point.x - expected.x).abs() < 1e-12);
        assert!((point.y - expected.y).abs() < 1e-12);
    }

    #[rstest]
    fn midpoint_is_half_way() {
        let mid = midpoint(Coord { x: -1.0, y: 2.0 }, Coord { x: 1.0, y: 4.0 });
        assert_eq!(mid, Coord { x: 0.0, y: 3.0 });
    }

    #[rstest]
    fn bounding_box_ignores_argument_order() {
        let a = Coord { x: 126.6, y: 37.3 };
        let b = Coord { x: 126.7, y: 37.4 };
        assert_eq!(
            bounding_box(a, b, DEFAULT_BBOX_MARGIN_DEG),
            bounding_box(b, a, DEFAULT_BBOX_MARGIN_DEG)
        );
    }
}
