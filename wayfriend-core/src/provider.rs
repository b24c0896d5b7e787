//! Acquisition of the walking network for a bounding box.
//!
//! The router never builds graphs itself; it asks a [`GraphProvider`] for the
//! walkable network covering each request's bounding box.

use geo::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::WalkGraph;

/// Which ways a provider should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    /// Ways a pedestrian may use.
    #[default]
    Walk,
    /// Every way carrying a `highway` tag.
    All,
}

/// Errors raised while loading a walking graph.
#[derive(Debug, Error)]
pub enum GraphProviderError {
    /// The provider has no data covering the requested area.
    #[error("no walkable network within the requested bounding box")]
    EmptyArea,
    /// The backing source could not be read.
    #[error("failed to read network source: {message}")]
    Source {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying error, when one is available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl GraphProviderError {
    /// Wrap an arbitrary source error.
    pub fn from_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Load walkable networks for a bounding box.
///
/// Implementations return an undirected [`WalkGraph`] restricted to its
/// largest connected component, so every pair of nodes in the result is
/// mutually reachable. The bounding box uses WGS84 coordinates
/// (`x = longitude`, `y = latitude`).
///
/// # Examples
///
/// ```rust
/// use geo::{Coord, Rect};
/// use wayfriend_core::{GraphProvider, GraphProviderError, NetworkType, WalkGraph};
///
/// struct SingleEdge;
///
/// impl GraphProvider for SingleEdge {
///     fn load_walking_graph(
///         &self,
///         _bbox: &Rect<f64>,
///         _network_type: NetworkType,
///     ) -> Result<WalkGraph, GraphProviderError> {
///         let mut builder = WalkGraph::builder();
///         builder.add_node(1, Coord { x: 0.0, y: 0.0 });
///         builder.add_node(2, Coord { x: 0.001, y: 0.0 });
///         builder.add_edge(1, 2, None, None);
///         Ok(builder.build())
///     }
/// }
///
/// let bbox = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 });
/// let graph = SingleEdge.load_walking_graph(&bbox, NetworkType::Walk)?;
/// assert_eq!(graph.edge_count(), 1);
/// # Ok::<(), GraphProviderError>(())
/// ```
pub trait GraphProvider {
    /// Return the walking network covering `bbox`.
    fn load_walking_graph(
        &self,
        bbox: &Rect<f64>,
        network_type: NetworkType,
    ) -> Result<WalkGraph, GraphProviderError>;
}
