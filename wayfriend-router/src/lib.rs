//! Obstacle-aware pedestrian routing for Wayfriend.
//!
//! This crate provides [`AvoidanceRouter`], the default implementation of the
//! [`Router`](wayfriend_core::Router) trait. It loads the walking network for
//! a request from a [`GraphProvider`](wayfriend_core::GraphProvider), weights
//! edges by length, nearby obstacle penalties and road class, and searches
//! with A*. When the best route still passes an obstacle type the caller asked
//! to avoid, that type is dropped and the search repeats, so callers always
//! receive a connected route together with an account of which obstacles it
//! could not avoid.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
pub mod encounter;
mod relaxation;
pub mod search;
pub mod stats;
pub mod weighting;

pub use config::{
    DEFAULT_MAX_SPAN_DEG, DEFAULT_SEGMENT_SAMPLES, DEFAULT_VEHICULAR_PENALTY, RouterConfig,
};
pub use encounter::{EncounterReport, TypeCount, check_encounters};
pub use relaxation::{AvoidanceRouter, RoundState};
pub use search::{FoundPath, NoPathError, find_path};
pub use stats::{StatsReport, compute_stats};
pub use weighting::WeightingEngine;
