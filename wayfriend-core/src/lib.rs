//! Core domain types for the Wayfriend routing engine.
//!
//! This crate defines the vocabulary shared by routers, data loaders and the
//! CLI: obstacles, avoidance requests, route results, the in-memory walking
//! graph, and the [`GraphProvider`] and [`ObstacleStore`] traits through which
//! the router reaches external data. Request validation lives here so invalid
//! input is rejected before any graph or obstacle is loaded.

#![forbid(unsafe_code)]

pub mod distance;
mod graph;
mod obstacle;
mod provider;
mod request;
mod route;
mod router;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use graph::{VEHICULAR_ROAD_CLASSES, WalkEdge, WalkGraph, WalkGraphBuilder, WalkNode};
pub use obstacle::Obstacle;
pub use petgraph::graph::NodeIndex;
pub use provider::{GraphProvider, GraphProviderError, NetworkType};
pub use request::{
    AvoidanceRequest, AvoidanceRequestValidationError, DEFAULT_PENALTIES, DEFAULT_RADIUS_M,
    default_penalties,
};
pub use route::{ObstacleStats, RouteResult};
pub use router::{RouteError, Router};
pub use store::{ObstacleStore, ObstacleStoreError};
#[cfg(feature = "store-sqlite")]
pub use store::{OBSTACLES_TABLE_SCHEMA, SqliteObstacleStore, SqliteObstacleStoreError};
