//! Route command implementation for the Wayfriend CLI.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wayfriend_core::{AvoidanceRequest, NetworkType, RouteResult, Router, SqliteObstacleStore};
use wayfriend_data::PbfGraphProvider;
use wayfriend_router::{AvoidanceRouter, RouterConfig};

use crate::fs::{open_utf8_file, require_existing};
use crate::{
    ARG_BBOX_MARGIN_DEG, ARG_NETWORK, ARG_OBSTACLES_DB, ARG_OSM_PBF, ARG_ROUTE_REQUEST, CliError,
    ENV_ROUTE_OBSTACLES_DB, ENV_ROUTE_OSM_PBF, ENV_ROUTE_REQUEST,
};

/// Road network filter selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum NetworkArg {
    /// Pedestrian-accessible ways only.
    #[default]
    Walk,
    /// Every highway way.
    All,
}

impl From<NetworkArg> for NetworkType {
    fn from(value: NetworkArg) -> Self {
        match value {
            NetworkArg::Walk => Self::Walk,
            NetworkArg::All => Self::All,
        }
    }
}

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "route",
    long_about = "Route between two points while steering around detected \
                 obstacles. The walking network is read from an OSM PBF \
                 extract and obstacles from an SQLite table written by \
                 `import-obstacles`. The request is a JSON-encoded \
                 AvoidanceRequest; the result is printed as JSON.",
    about = "Compute an obstacle-aware walking route"
)]
#[ortho_config(prefix = "WAYFRIEND")]
pub(crate) struct RouteArgs {
    /// Path to a JSON file containing an AvoidanceRequest.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Path to the OpenStreetMap PBF extract.
    #[arg(long = ARG_OSM_PBF, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_pbf: Option<Utf8PathBuf>,
    /// Path to the SQLite obstacle database.
    #[arg(long = ARG_OBSTACLES_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) obstacles_db: Option<Utf8PathBuf>,
    /// Margin in degrees added around start and end when loading data.
    #[arg(long = ARG_BBOX_MARGIN_DEG, value_name = "deg")]
    #[serde(default)]
    pub(crate) bbox_margin_deg: Option<f64>,
    /// Road network filter.
    #[arg(long = ARG_NETWORK, value_enum)]
    #[serde(default)]
    pub(crate) network: Option<NetworkArg>,
}

impl RouteArgs {
    pub(crate) fn into_config(self) -> Result<RouteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteConfig::try_from(merged)
    }
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteConfig {
    /// Path to the JSON request file.
    pub(crate) request_path: Utf8PathBuf,
    /// Path to the OSM PBF extract.
    pub(crate) osm_pbf: Utf8PathBuf,
    /// Path to the SQLite obstacle database.
    pub(crate) obstacles_db: Utf8PathBuf,
    /// Router tuning derived from the flags.
    pub(crate) router: RouterConfig,
}

impl RouteConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.request_path, ARG_ROUTE_REQUEST)?;
        require_existing(&self.osm_pbf, ARG_OSM_PBF)?;
        require_existing(&self.obstacles_db, ARG_OBSTACLES_DB)?;
        Ok(())
    }
}

impl TryFrom<RouteArgs> for RouteConfig {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE_REQUEST,
            env: ENV_ROUTE_REQUEST,
        })?;
        let osm_pbf = args.osm_pbf.ok_or(CliError::MissingArgument {
            field: ARG_OSM_PBF,
            env: ENV_ROUTE_OSM_PBF,
        })?;
        let obstacles_db = args.obstacles_db.ok_or(CliError::MissingArgument {
            field: ARG_OBSTACLES_DB,
            env: ENV_ROUTE_OBSTACLES_DB,
        })?;

        let mut router = RouterConfig::default()
            .with_network_type(args.network.unwrap_or_default().into());
        if let Some(margin) = args.bbox_margin_deg {
            if !margin.is_finite() || margin < 0.0 {
                return Err(CliError::InvalidBboxMargin { value: margin });
            }
            router = router.with_bbox_margin_deg(margin);
        }

        Ok(Self {
            request_path,
            osm_pbf,
            obstacles_db,
            router,
        })
    }
}

/// Builds a router instance for the current route invocation.
pub(crate) trait RouterBuilder {
    fn build(&self, config: &RouteConfig) -> Result<Box<dyn Router>, CliError>;
}

pub(crate) struct DefaultRouterBuilder;

impl RouterBuilder for DefaultRouterBuilder {
    fn build(&self, config: &RouteConfig) -> Result<Box<dyn Router>, CliError> {
        let provider = PbfGraphProvider::from_path(config.osm_pbf.as_std_path()).map_err(
            |source| CliError::LoadNetwork {
                path: config.osm_pbf.clone(),
                source,
            },
        )?;
        let store = SqliteObstacleStore::open(config.obstacles_db.as_std_path())?;
        Ok(Box::new(AvoidanceRouter::with_config(
            provider,
            store,
            config.router,
        )))
    }
}

pub(crate) fn run_route(args: RouteArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_route_with(args, &DefaultRouterBuilder, &mut stdout)
}

pub(crate) fn run_route_with(
    args: RouteArgs,
    builder: &dyn RouterBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let result = execute_route(args, builder)?;
    write_route_result(writer, &result)
}

fn execute_route(args: RouteArgs, builder: &dyn RouterBuilder) -> Result<RouteResult, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let request = load_route_request(&config.request_path)?;
    request
        .validate_with_span(config.router.max_span_deg)
        .map_err(|source| CliError::InvalidRouteRequest {
            path: config.request_path.clone(),
            source,
        })?;
    let router = builder.build(&config)?;
    router
        .find_route(&request)
        .map_err(|source| CliError::Route { source })
}

/// Loads a JSON-encoded [`AvoidanceRequest`] from disk.
pub(crate) fn load_route_request(path: &Utf8Path) -> Result<AvoidanceRequest, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenRouteRequest {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        CliError::ParseRouteRequest {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn write_route_result(writer: &mut dyn Write, result: &RouteResult) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(result).map_err(CliError::SerializeRouteResult)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RouteConfig, CliError> {
    let merged = RouteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RouteConfig::try_from(merged)
}
