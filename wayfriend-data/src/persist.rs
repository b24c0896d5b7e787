//! SQLite persistence for detected obstacles.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::debug;
use rusqlite::{Connection, Error as SqliteError, Transaction};
use thiserror::Error;
use wayfriend_core::{OBSTACLES_TABLE_SCHEMA, Obstacle};

/// Errors raised when persisting obstacles to SQLite.
#[derive(Debug, Error)]
pub enum PersistObstaclesError {
    /// Failed to create the parent directory for the SQLite artefact.
    #[error("failed to create parent directory {path:?}")]
    CreateDirectory {
        /// Path of the directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Destination database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning the transaction failed.
    #[error("failed to begin obstacle persistence transaction")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating or clearing the `obstacles` table failed.
    #[error("failed to prepare obstacles table")]
    PrepareTable {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// An obstacle identifier could not be represented as an SQLite integer.
    #[error("obstacle id {obstacle_id} exceeds SQLite i64 range")]
    ObstacleIdOutOfRange {
        /// Identifier that failed the conversion.
        obstacle_id: u64,
    },
    /// Preparing the insert statement failed.
    #[error("failed to prepare obstacle insert statement")]
    PrepareInsert {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing an obstacle row failed.
    #[error("failed to persist obstacle {obstacle_id}")]
    PersistRow {
        /// Identifier of the obstacle being persisted.
        obstacle_id: u64,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Committing the transaction failed.
    #[error("failed to commit obstacle persistence transaction")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Write `obstacles` to the `obstacles` table of the database at `path`.
///
/// The table is created when missing and its previous contents are replaced,
/// so the database holds exactly the given snapshot afterwards. Parent
/// directories are created automatically. The write is transactional.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use geo::Coord;
/// use wayfriend_core::Obstacle;
/// use wayfriend_data::persist_obstacles;
///
/// # fn main() -> Result<(), wayfriend_data::PersistObstaclesError> {
/// let obstacles = [Obstacle::new(1, "curb", Coord { x: 126.65, y: 37.37 })];
/// persist_obstacles(Utf8Path::new("artefacts/obstacles.db"), &obstacles)?;
/// # Ok(())
/// # }
/// ```
pub fn persist_obstacles(
    path: &Utf8Path,
    obstacles: &[Obstacle],
) -> Result<(), PersistObstaclesError> {
    ensure_parent_dir(path)?;
    let mut connection =
        Connection::open(path.as_std_path()).map_err(|source| PersistObstaclesError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| PersistObstaclesError::BeginTransaction { source })?;

    reset_table(&transaction)?;
    persist_rows(&transaction, obstacles)?;

    transaction
        .commit()
        .map_err(|source| PersistObstaclesError::Commit { source })?;
    debug!("persisted {} obstacles to {path}", obstacles.len());
    Ok(())
}

fn ensure_parent_dir(path: &Utf8Path) -> Result<(), PersistObstaclesError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base, relative) = if parent.is_absolute() {
        ("/", parent.strip_prefix("/").unwrap_or(parent))
    } else {
        (".", parent)
    };
    let create_error = |source| PersistObstaclesError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    };

    fs_utf8::Dir::open_ambient_dir(base, ambient_authority())
        .map_err(create_error)?
        .create_dir_all(relative)
        .map_err(create_error)
}

fn reset_table(transaction: &Transaction<'_>) -> Result<(), PersistObstaclesError> {
    transaction
        .execute(OBSTACLES_TABLE_SCHEMA, [])
        .and_then(|_| transaction.execute("DELETE FROM obstacles", []))
        .map(|_| ())
        .map_err(|source| PersistObstaclesError::PrepareTable { source })
}

fn persist_rows(
    transaction: &Transaction<'_>,
    obstacles: &[Obstacle],
) -> Result<(), PersistObstaclesError> {
    if obstacles.is_empty() {
        return Ok(());
    }

    let mut statement = transaction
        .prepare(
            "INSERT OR REPLACE INTO obstacles (id, type, lat, lng, confidence, detected_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .map_err(|source| PersistObstaclesError::PrepareInsert { source })?;

    for obstacle in obstacles {
        let obstacle_id = i64::try_from(obstacle.id).map_err(|_| {
            PersistObstaclesError::ObstacleIdOutOfRange {
                obstacle_id: obstacle.id,
            }
        })?;
        statement
            .execute((
                obstacle_id,
                &obstacle.kind,
                obstacle.location.y,
                obstacle.location.x,
                obstacle.confidence.map(f64::from),
                obstacle.detected_at,
            ))
            .map_err(|source| PersistObstaclesError::PersistRow {
                obstacle_id: obstacle.id,
                source,
            })?;
    }

    Ok(())
}
