//! Data access adapters for the Wayfriend engine.
//!
//! Responsibilities:
//! - Load pedestrian networks from OpenStreetMap PBF extracts and serve them
//!   through [`GraphProvider`](wayfriend_core::GraphProvider).
//! - Persist detected obstacles into the SQLite table read by
//!   [`SqliteObstacleStore`](wayfriend_core::SqliteObstacleStore).
//!
//! Boundaries:
//! - Do not encode routing rules (live in `wayfriend-router`).
//!
//! Invariants:
//! - Loaded networks are immutable and shared across requests.
//! - No global mutable state.

#![forbid(unsafe_code)]

mod network;
mod persist;

pub use network::{PbfGraphProvider, PbfGraphProviderError};
pub use persist::{PersistObstaclesError, persist_obstacles};
