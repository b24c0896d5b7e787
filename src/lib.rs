//! Facade crate for the Wayfriend pedestrian routing engine.
//!
//! This crate re-exports the core domain types and the default
//! [`AvoidanceRouter`], and exposes the SQLite obstacle store and the OSM PBF
//! graph provider behind feature flags.

#![forbid(unsafe_code)]

pub use wayfriend_core::{
    AvoidanceRequest, AvoidanceRequestValidationError, GraphProvider, GraphProviderError,
    NetworkType, Obstacle, ObstacleStats, ObstacleStore, ObstacleStoreError, RouteError,
    RouteResult, Router, WalkEdge, WalkGraph, WalkNode, distance,
};
pub use wayfriend_router::{AvoidanceRouter, RouterConfig};

#[cfg(feature = "store-sqlite")]
pub use wayfriend_core::{SqliteObstacleStore, SqliteObstacleStoreError};

#[cfg(feature = "data")]
pub use wayfriend_data::{
    PbfGraphProvider, PbfGraphProviderError, PersistObstaclesError, persist_obstacles,
};
