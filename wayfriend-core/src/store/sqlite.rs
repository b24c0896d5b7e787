//! SQLite-backed obstacle store.

use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use geo::{Coord, Rect};
use rstar::{AABB, RTree};
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

use crate::Obstacle;

use super::{ObstacleStore, ObstacleStoreError};

/// DDL for the `obstacles` table read by [`SqliteObstacleStore`].
pub const OBSTACLES_TABLE_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS obstacles (
    id INTEGER PRIMARY KEY,
    type TEXT NOT NULL,
    lat REAL NOT NULL,
    lng REAL NOT NULL,
    confidence REAL,
    detected_at TEXT
)";

/// Error raised when opening a persisted obstacle database.
#[derive(Debug, Error)]
pub enum SqliteObstacleStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored row carried coordinates outside WGS84 ranges.
    #[error("obstacle {id} has invalid coordinates ({lng}, {lat})")]
    InvalidLocation {
        /// Identifier of the offending row.
        id: u64,
        /// Stored longitude.
        lng: f64,
        /// Stored latitude.
        lat: f64,
    },
    /// Generic SQLite error when reading obstacle rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Read-only obstacle store backed by an SQLite table and an in-memory
/// R\*-tree.
///
/// Rows are loaded once on [`open`](Self::open); later writes to the
/// database are not observed.
pub struct SqliteObstacleStore {
    index: RTree<Obstacle>,
}

impl fmt::Debug for SqliteObstacleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteObstacleStore")
            .field("entries", &self.index.size())
            .finish_non_exhaustive()
    }
}

impl SqliteObstacleStore {
    /// Open the obstacle table at `database_path` and index its rows.
    pub fn open<P>(database_path: P) -> Result<Self, SqliteObstacleStoreError>
    where
        P: AsRef<Path>,
    {
        let database_path = database_path.as_ref();
        let connection =
            Connection::open_with_flags(database_path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
                |source| SqliteObstacleStoreError::OpenDatabase {
                    path: database_path.to_path_buf(),
                    source,
                },
            )?;

        let obstacles = load_obstacles(&connection)?;
        log::debug!(
            "loaded {} obstacles from {}",
            obstacles.len(),
            database_path.display()
        );

        Ok(Self {
            index: RTree::bulk_load(obstacles),
        })
    }

    /// Number of indexed obstacles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.size()
    }

    /// Whether the store holds no obstacles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.size() == 0
    }
}

impl ObstacleStore for SqliteObstacleStore {
    fn query(
        &self,
        types: &BTreeSet<String>,
        bbox: &Rect<f64>,
    ) -> Result<Vec<Obstacle>, ObstacleStoreError> {
        if types.is_empty() {
            return Ok(Vec::new());
        }

        let envelope =
            AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y]);
        let mut obstacles: Vec<_> = self
            .index
            .locate_in_envelope_intersecting(&envelope)
            .filter(|obstacle| types.contains(&obstacle.kind))
            .cloned()
            .collect();

        obstacles.sort_unstable_by_key(|obstacle| obstacle.id);

        Ok(obstacles)
    }
}

fn load_obstacles(connection: &Connection) -> Result<Vec<Obstacle>, SqliteObstacleStoreError> {
    let mut statement = connection
        .prepare("SELECT id, type, lat, lng, confidence, detected_at FROM obstacles")?;
    let mut rows = statement.query([])?;
    let mut obstacles = Vec::new();

    while let Some(row) = rows.next()? {
        let id: u64 = row.get(0)?;
        let kind: String = row.get(1)?;
        let lat: f64 = row.get(2)?;
        let lng: f64 = row.get(3)?;
        let confidence: Option<f32> = row.get(4)?;
        let detected_at: Option<DateTime<Utc>> = row.get(5)?;

        if !(lng.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lng)
            && (-90.0..=90.0).contains(&lat))
        {
            return Err(SqliteObstacleStoreError::InvalidLocation { id, lng, lat });
        }

        obstacles.push(Obstacle {
            id,
            kind,
            location: Coord { x: lng, y: lat },
            confidence,
            detected_at,
        });
    }

    Ok(obstacles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_obstacles_database;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    fn types(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[fixture]
    fn temp_db() -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("obstacles.db");
        (dir, path)
    }

    #[fixture]
    fn sample_obstacles() -> Vec<Obstacle> {
        vec![
            Obstacle::new(3, "stairs", Coord { x: 126.651, y: 37.371 }),
            Obstacle::new(1, "curb", Coord { x: 126.650, y: 37.370 }).with_confidence(0.75),
            Obstacle::new(2, "curb", Coord { x: 127.5, y: 38.0 }),
        ]
    }

    #[rstest]
    fn returns_obstacles_in_bbox_sorted_by_id(
        temp_db: (TempDir, PathBuf),
        sample_obstacles: Vec<Obstacle>,
    ) {
        let (_dir, path) = temp_db;
        write_obstacles_database(&path, &sample_obstacles).expect("persist obstacles");
        let store = SqliteObstacleStore::open(&path).expect("open store");
        assert_eq!(store.len(), 3);

        let bbox = Rect::new(Coord { x: 126.6, y: 37.3 }, Coord { x: 126.7, y: 37.4 });
        let found = store
            .query(&types(&["curb", "stairs"]), &bbox)
            .expect("query succeeds");
        assert_eq!(found.iter().map(|o| o.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(found.first().and_then(|o| o.confidence), Some(0.75));
    }

    #[rstest]
    fn filters_types_and_handles_empty_set(
        temp_db: (TempDir, PathBuf),
        sample_obstacles: Vec<Obstacle>,
    ) {
        let (_dir, path) = temp_db;
        write_obstacles_database(&path, &sample_obstacles).expect("persist obstacles");
        let store = SqliteObstacleStore::open(&path).expect("open store");
        let bbox = Rect::new(Coord { x: 120.0, y: 30.0 }, Coord { x: 130.0, y: 40.0 });

        let stairs = store.query(&types(&["stairs"]), &bbox).expect("query");
        assert_eq!(stairs.len(), 1);
        assert!(store.query(&BTreeSet::new(), &bbox).expect("query").is_empty());
    }

    #[rstest]
    fn round_trips_detection_time(temp_db: (TempDir, PathBuf)) {
        let (_dir, path) = temp_db;
        let at = Utc
            .with_ymd_and_hms(2025, 3, 14, 15, 9, 26)
            .single()
            .expect("valid timestamp");
        let obstacle = Obstacle::new(4, "bollard", Coord { x: 0.0, y: 0.0 }).with_detected_at(at);
        write_obstacles_database(&path, std::slice::from_ref(&obstacle))
            .expect("persist obstacles");

        let store = SqliteObstacleStore::open(&path).expect("open store");
        let bbox = Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 });
        let found = store.query(&types(&["bollard"]), &bbox).expect("query");
        assert_eq!(found, vec![obstacle]);
    }

    #[rstest]
    fn missing_database_fails_to_open(temp_db: (TempDir, PathBuf)) {
        let (_dir, path) = temp_db;
        let error = SqliteObstacleStore::open(&path).expect_err("missing file should fail");
        assert!(matches!(
            error,
            SqliteObstacleStoreError::OpenDatabase { .. }
        ));
    }

    #[rstest]
    fn rejects_out_of_range_rows(temp_db: (TempDir, PathBuf)) {
        let (_dir, path) = temp_db;
        let connection = Connection::open(&path).expect("create database");
        connection
            .execute(OBSTACLES_TABLE_SCHEMA, [])
            .expect("create table");
        connection
            .execute(
                "INSERT INTO obstacles (id, type, lat, lng) VALUES (8, 'curb', 95.0, 0.0)",
                [],
            )
            .expect("insert row");
        drop(connection);

        let error = SqliteObstacleStore::open(&path).expect_err("bad row should fail");
        assert!(matches!(
            error,
            SqliteObstacleStoreError::InvalidLocation { id: 8, .. }
        ));
    }
}
