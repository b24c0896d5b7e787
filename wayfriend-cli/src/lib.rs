//! Command-line interface for the Wayfriend routing engine.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod import;
mod route;

pub use error::CliError;
use import::{ImportObstaclesArgs, run_import};
use route::{RouteArgs, run_route};

pub(crate) const ARG_ROUTE_REQUEST: &str = "request";
pub(crate) const ARG_OSM_PBF: &str = "osm-pbf";
pub(crate) const ARG_OBSTACLES_DB: &str = "obstacles-db";
pub(crate) const ARG_BBOX_MARGIN_DEG: &str = "bbox-margin-deg";
pub(crate) const ARG_NETWORK: &str = "network";
pub(crate) const ARG_IMPORT_SOURCE: &str = "obstacles";
pub(crate) const ENV_ROUTE_REQUEST: &str = "WAYFRIEND_CMDS_ROUTE_REQUEST_PATH";
pub(crate) const ENV_ROUTE_OSM_PBF: &str = "WAYFRIEND_CMDS_ROUTE_OSM_PBF";
pub(crate) const ENV_ROUTE_OBSTACLES_DB: &str = "WAYFRIEND_CMDS_ROUTE_OBSTACLES_DB";
pub(crate) const ENV_IMPORT_SOURCE: &str = "WAYFRIEND_CMDS_IMPORT_OBSTACLES_SOURCE_PATH";
pub(crate) const ENV_IMPORT_OBSTACLES_DB: &str = "WAYFRIEND_CMDS_IMPORT_OBSTACLES_OBSTACLES_DB";

/// Run the Wayfriend CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Route(args) => run_route(args),
        Command::ImportObstacles(args) => run_import(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "wayfriend",
    about = "Accessibility-aware pedestrian routing",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute an obstacle-aware walking route.
    Route(RouteArgs),
    /// Load detected obstacles into the SQLite obstacle table.
    ImportObstacles(ImportObstaclesArgs),
}

#[cfg(test)]
mod tests;
