//! In-memory providers, stores and graph builders used by unit and behaviour
//! tests.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use geo::{Coord, Intersects, Rect};

use crate::distance::haversine_m;
use crate::{
    GraphProvider, GraphProviderError, NetworkType, Obstacle, ObstacleStore, ObstacleStoreError,
    WalkGraph,
};

/// In-memory `ObstacleStore` implementation used in tests.
///
/// The store performs a linear scan and counts the queries it answers.
#[derive(Default, Debug)]
pub struct MemoryObstacleStore {
    obstacles: Vec<Obstacle>,
    queries: AtomicUsize,
}

impl MemoryObstacleStore {
    /// Create a store from a collection of obstacles.
    pub fn with_obstacles<I>(obstacles: I) -> Self
    where
        I: IntoIterator<Item = Obstacle>,
    {
        Self {
            obstacles: obstacles.into_iter().collect(),
            queries: AtomicUsize::new(0),
        }
    }

    /// Number of queries answered so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl ObstacleStore for MemoryObstacleStore {
    fn query(
        &self,
        types: &BTreeSet<String>,
        bbox: &Rect<f64>,
    ) -> Result<Vec<Obstacle>, ObstacleStoreError> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let mut found: Vec<_> = self
            .obstacles
            .iter()
            // `Intersects` treats boundary points as inside the rectangle.
            .filter(|o| types.contains(&o.kind) && bbox.intersects(&o.location))
            .cloned()
            .collect();
        found.sort_unstable_by_key(|o| o.id);
        Ok(found)
    }
}

/// `ObstacleStore` whose every query fails.
#[derive(Default, Debug, Copy, Clone)]
pub struct FailingObstacleStore;

impl ObstacleStore for FailingObstacleStore {
    fn query(
        &self,
        _types: &BTreeSet<String>,
        _bbox: &Rect<f64>,
    ) -> Result<Vec<Obstacle>, ObstacleStoreError> {
        Err(ObstacleStoreError::backend("store unavailable"))
    }
}

/// `GraphProvider` returning a copy of a fixed graph for every bbox.
#[derive(Debug, Clone)]
pub struct FixedGraphProvider {
    graph: WalkGraph,
}

impl FixedGraphProvider {
    /// Serve `graph` unchanged.
    pub fn new(graph: WalkGraph) -> Self {
        Self { graph }
    }

    /// Serve the polyline built by [`line_graph`].
    pub fn line(points: &[(f64, f64)]) -> Self {
        Self::new(line_graph(points))
    }
}

impl GraphProvider for FixedGraphProvider {
    fn load_walking_graph(
        &self,
        _bbox: &Rect<f64>,
        _network_type: NetworkType,
    ) -> Result<WalkGraph, GraphProviderError> {
        Ok(self.graph.clone())
    }
}

/// `GraphProvider` whose every load fails.
#[derive(Default, Debug, Copy, Clone)]
pub struct FailingGraphProvider;

impl GraphProvider for FailingGraphProvider {
    fn load_walking_graph(
        &self,
        _bbox: &Rect<f64>,
        _network_type: NetworkType,
    ) -> Result<WalkGraph, GraphProviderError> {
        Err(GraphProviderError::EmptyArea)
    }
}

/// Build a path graph through `points` given as `(lon, lat)` pairs.
///
/// Nodes get ids `0..points.len()`. Edges carry no length so the weighting
/// pass derives one from the endpoints.
pub fn line_graph(points: &[(f64, f64)]) -> WalkGraph {
    let mut builder = WalkGraph::builder();
    for (id, (x, y)) in (0_u64..).zip(points) {
        builder.add_node(id, Coord { x: *x, y: *y });
        if id > 0 {
            builder.add_edge(id - 1, id, None, None);
        }
    }
    builder.build()
}

/// Build a `rows × cols` lattice with `spacing_deg` between neighbours,
/// anchored at `origin` (south-west corner).
///
/// Node `(row, col)` has id `row * cols + col`. Every edge carries its
/// haversine length and the `footway` road class.
pub fn grid_graph(rows: u64, cols: u64, spacing_deg: f64, origin: Coord<f64>) -> WalkGraph {
    let mut builder = WalkGraph::builder();
    let position = |row: u64, col: u64| Coord {
        x: origin.x + spacing_deg * col as f64,
        y: origin.y + spacing_deg * row as f64,
    };
    for row in 0..rows {
        for col in 0..cols {
            builder.add_node(row * cols + col, position(row, col));
        }
    }
    for row in 0..rows {
        for col in 0..cols {
            let id = row * cols + col;
            if col + 1 < cols {
                let length = haversine_m(position(row, col), position(row, col + 1));
                builder.add_edge(id, id + 1, Some(length), Some("footway".to_owned()));
            }
            if row + 1 < rows {
                let length = haversine_m(position(row, col), position(row + 1, col));
                builder.add_edge(id, id + cols, Some(length), Some("footway".to_owned()));
            }
        }
    }
    builder.build()
}

/// Write `obstacles` into a fresh `obstacles` table at `path`.
#[cfg(feature = "store-sqlite")]
pub fn write_obstacles_database(
    path: &std::path::Path,
    obstacles: &[Obstacle],
) -> Result<(), rusqlite::Error> {
    let connection = rusqlite::Connection::open(path)?;
    connection.execute(crate::OBSTACLES_TABLE_SCHEMA, [])?;
    let mut insert = connection.prepare(
        "INSERT INTO obstacles (id, type, lat, lng, confidence, detected_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for obstacle in obstacles {
        insert.execute(rusqlite::params![
            obstacle.id,
            obstacle.kind,
            obstacle.location.y,
            obstacle.location.x,
            obstacle.confidence,
            obstacle.detected_at,
        ])?;
    }
    Ok(())
}
