//! Import command: load an obstacle snapshot into SQLite.

use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wayfriend_core::Obstacle;
use wayfriend_data::persist_obstacles;

use crate::fs::{open_utf8_file, require_existing};
use crate::{
    ARG_IMPORT_SOURCE, ARG_OBSTACLES_DB, CliError, ENV_IMPORT_OBSTACLES_DB, ENV_IMPORT_SOURCE,
};

/// CLI arguments for the `import-obstacles` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import-obstacles",
    long_about = "Replace the obstacle table of an SQLite database with the \
                 contents of a JSON array of obstacles. Each entry carries \
                 an id, a type, a location and optional confidence and \
                 detection time.",
    about = "Load detected obstacles into SQLite"
)]
#[ortho_config(prefix = "WAYFRIEND")]
pub(crate) struct ImportObstaclesArgs {
    /// Path to a JSON array of obstacles.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) source_path: Option<Utf8PathBuf>,
    /// Path to the SQLite obstacle database to write.
    #[arg(long = ARG_OBSTACLES_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) obstacles_db: Option<Utf8PathBuf>,
}

/// Resolved `import-obstacles` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) source_path: Utf8PathBuf,
    pub(crate) obstacles_db: Utf8PathBuf,
}

impl TryFrom<ImportObstaclesArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportObstaclesArgs) -> Result<Self, Self::Error> {
        let source_path = args.source_path.ok_or(CliError::MissingArgument {
            field: ARG_IMPORT_SOURCE,
            env: ENV_IMPORT_SOURCE,
        })?;
        let obstacles_db = args.obstacles_db.ok_or(CliError::MissingArgument {
            field: ARG_OBSTACLES_DB,
            env: ENV_IMPORT_OBSTACLES_DB,
        })?;
        Ok(Self {
            source_path,
            obstacles_db,
        })
    }
}

pub(crate) fn run_import(args: ImportObstaclesArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_import_with(args, &mut stdout)
}

pub(crate) fn run_import_with(
    args: ImportObstaclesArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = ImportConfig::try_from(merged)?;
    require_existing(&config.source_path, ARG_IMPORT_SOURCE)?;

    let obstacles = load_obstacles(&config.source_path)?;
    persist_obstacles(&config.obstacles_db, &obstacles).map_err(|source| {
        CliError::PersistObstacles {
            path: config.obstacles_db.clone(),
            source,
        }
    })?;
    writeln!(
        writer,
        "imported {} obstacles into {}",
        obstacles.len(),
        config.obstacles_db
    )
    .map_err(CliError::WriteOutput)
}

/// Loads a JSON array of obstacles from disk.
pub(crate) fn load_obstacles(path: &Utf8Path) -> Result<Vec<Obstacle>, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenObstacles {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseObstacles {
        path: path.to_path_buf(),
        source,
    })
}
