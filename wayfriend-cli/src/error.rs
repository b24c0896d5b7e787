//! Error types emitted by the Wayfriend CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use wayfriend_core::{AvoidanceRequestValidationError, RouteError, SqliteObstacleStoreError};
use wayfriend_data::{PbfGraphProviderError, PersistObstaclesError};

/// Errors emitted by the Wayfriend CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Name of the missing option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// The bounding-box margin was negative or not finite.
    #[error("--bbox-margin-deg must be a non-negative finite number, got {value}")]
    InvalidBboxMargin {
        /// Supplied margin.
        value: f64,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Option naming the path.
        field: &'static str,
        /// Path that was checked.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Option naming the path.
        field: &'static str,
        /// Path that was checked.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Option naming the path.
        field: &'static str,
        /// Path that was checked.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the route request file failed.
    #[error("failed to open route request at {path:?}: {source}")]
    OpenRouteRequest {
        /// Request path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Route request JSON could not be decoded.
    #[error("failed to parse route request JSON at {path:?}: {source}")]
    ParseRouteRequest {
        /// Request path.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The route request payload failed validation.
    #[error("route request in {path:?} failed validation: {source}")]
    InvalidRouteRequest {
        /// Request path.
        path: Utf8PathBuf,
        /// Validation failure.
        #[source]
        source: AvoidanceRequestValidationError,
    },
    /// Loading the OSM walking network failed.
    #[error("failed to load walking network from {path:?}: {source}")]
    LoadNetwork {
        /// PBF extract path.
        path: Utf8PathBuf,
        /// Loader error.
        #[source]
        source: PbfGraphProviderError,
    },
    /// Opening the SQLite obstacle store failed.
    #[error(transparent)]
    OpenObstacleStore(#[from] SqliteObstacleStoreError),
    /// The router rejected the request.
    #[error("routing failed: {source}")]
    Route {
        /// Router error.
        #[source]
        source: RouteError,
    },
    /// Serializing the route result failed.
    #[error("failed to serialize route result: {0}")]
    SerializeRouteResult(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write command output: {0}")]
    WriteOutput(#[source] std::io::Error),
    /// Opening the obstacle snapshot failed.
    #[error("failed to open obstacle snapshot at {path:?}: {source}")]
    OpenObstacles {
        /// Snapshot path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The obstacle snapshot JSON could not be decoded.
    #[error("failed to parse obstacle snapshot JSON at {path:?}: {source}")]
    ParseObstacles {
        /// Snapshot path.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// Persisting obstacles to SQLite failed.
    #[error("failed to persist obstacles to {path:?}: {source}")]
    PersistObstacles {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Persistence error.
        #[source]
        source: PersistObstaclesError,
    },
}
