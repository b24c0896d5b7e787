use thiserror::Error;

use crate::{
    AvoidanceRequest, AvoidanceRequestValidationError, GraphProviderError, ObstacleStoreError,
    RouteResult,
};

/// Errors returned by [`Router::find_route`].
///
/// An unreachable destination is not an error: routers answer it with a
/// straight-line fallback [`RouteResult`].
#[derive(Debug, Error)]
pub enum RouteError {
    /// The request failed validation before any data was loaded.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] AvoidanceRequestValidationError),
    /// The walking network could not be loaded.
    #[error(transparent)]
    Graph(#[from] GraphProviderError),
    /// Obstacles could not be queried.
    #[error(transparent)]
    Obstacles(#[from] ObstacleStoreError),
}

/// Compute obstacle-aware walking routes.
///
/// Routers must be `Send + Sync` so a single instance can serve concurrent
/// requests; each call works on its own graph and obstacle snapshots.
pub trait Router: Send + Sync {
    /// Route from `request.start` to `request.end`, avoiding the requested
    /// obstacle types where a connected path allows it.
    fn find_route(&self, request: &AvoidanceRequest) -> Result<RouteResult, RouteError>;
}
