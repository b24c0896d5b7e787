//! Spatial access to detected obstacles.
//!
//! The [`ObstacleStore`] trait is the router's only view of obstacle data.
//! Queries combine a type filter with an axis-aligned bounding box.

use std::collections::BTreeSet;

use geo::Rect;
use thiserror::Error;

use crate::Obstacle;

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{OBSTACLES_TABLE_SCHEMA, SqliteObstacleStore, SqliteObstacleStoreError};

/// Errors raised by an [`ObstacleStore`] query.
#[derive(Debug, Error)]
pub enum ObstacleStoreError {
    /// The backing storage failed while answering the query.
    #[error("obstacle store query failed: {message}")]
    Backend {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying error, when one is available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ObstacleStoreError {
    /// Build a backend error without an underlying cause.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }
}

/// Read-only access to persisted obstacles.
///
/// The bounding box uses WGS84 coordinates (`x = longitude`,
/// `y = latitude`) and containment includes boundary points. Results are
/// returned sorted by obstacle id so repeated queries are deterministic.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeSet;
/// use geo::{Coord, Intersects, Rect};
/// use wayfriend_core::{Obstacle, ObstacleStore, ObstacleStoreError};
///
/// struct VecStore(Vec<Obstacle>);
///
/// impl ObstacleStore for VecStore {
///     fn query(
///         &self,
///         types: &BTreeSet<String>,
///         bbox: &Rect<f64>,
///     ) -> Result<Vec<Obstacle>, ObstacleStoreError> {
///         Ok(self
///             .0
///             .iter()
///             .filter(|o| types.contains(&o.kind) && bbox.intersects(&o.location))
///             .cloned()
///             .collect())
///     }
/// }
///
/// let store = VecStore(vec![Obstacle::new(1, "curb", Coord { x: 0.0, y: 0.0 })]);
/// let bbox = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 });
/// let types = BTreeSet::from(["curb".to_owned()]);
/// assert_eq!(store.query(&types, &bbox)?.len(), 1);
/// assert!(store.query(&BTreeSet::new(), &bbox)?.is_empty());
/// # Ok::<(), ObstacleStoreError>(())
/// ```
pub trait ObstacleStore {
    /// Return obstacles whose type is in `types` and whose location lies in
    /// `bbox`.
    ///
    /// An empty `types` set yields no obstacles.
    fn query(
        &self,
        types: &BTreeSet<String>,
        bbox: &Rect<f64>,
    ) -> Result<Vec<Obstacle>, ObstacleStoreError>;
}
