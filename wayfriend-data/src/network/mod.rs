//! Walking networks loaded from OpenStreetMap PBF extracts.

use std::{
    fmt,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use geo::Rect;
use log::debug;
use osmpbf::{Element, ElementReader};
use thiserror::Error;
use wayfriend_core::{GraphProvider, GraphProviderError, NetworkType, WalkGraph};

mod accumulator;
mod filter;

use accumulator::WayNetwork;

/// Errors returned when loading an OSM PBF extract.
#[derive(Debug, Error)]
pub enum PbfGraphProviderError {
    /// The PBF file could not be opened.
    #[error("failed to open OSM PBF file at {path:?}")]
    Open {
        /// Underlying decoder error.
        #[source]
        source: osmpbf::Error,
        /// Path that failed to open.
        path: PathBuf,
    },
    /// The PBF file could not be decoded.
    #[error("failed to decode OSM PBF data at {path:?}")]
    Decode {
        /// Underlying decoder error.
        #[source]
        source: osmpbf::Error,
        /// Path being decoded.
        path: PathBuf,
    },
}

/// [`GraphProvider`] serving walk graphs cut from an OSM PBF extract.
///
/// Highway ways are read once by [`from_path`](Self::from_path). Each
/// [`load_walking_graph`](GraphProvider::load_walking_graph) call keeps the
/// segments whose endpoints lie inside the requested box and returns the
/// largest connected component.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
/// use geo::{Coord, Rect};
/// use wayfriend_core::{GraphProvider, NetworkType};
/// use wayfriend_data::PbfGraphProvider;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = PbfGraphProvider::from_path(Path::new("incheon.osm.pbf"))?;
/// let bbox = Rect::new(Coord { x: 126.64, y: 37.36 }, Coord { x: 126.67, y: 37.39 });
/// let graph = provider.load_walking_graph(&bbox, NetworkType::Walk)?;
/// println!("{} walkable nodes", graph.node_count());
/// # Ok(())
/// # }
/// ```
pub struct PbfGraphProvider {
    network: WayNetwork,
}

impl fmt::Debug for PbfGraphProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PbfGraphProvider")
            .field("ways", &self.network.way_count())
            .field("nodes", &self.network.node_count())
            .finish_non_exhaustive()
    }
}

impl PbfGraphProvider {
    /// Read the highway ways of the extract at `path`.
    ///
    /// Ways are collected in parallel; a second sequential pass resolves the
    /// coordinates of the nodes they reference.
    pub fn from_path(path: &Path) -> Result<Self, PbfGraphProviderError> {
        let reader = open_reader(path)?;
        let mut network = reader
            .par_map_reduce(
                |element| {
                    let mut network = WayNetwork::default();
                    network.process_element(element);
                    network
                },
                WayNetwork::default,
                WayNetwork::combine,
            )
            .map_err(|source| PbfGraphProviderError::Decode {
                source,
                path: path.to_path_buf(),
            })?;

        if network.pending_node_count() > 0 {
            let resolver = open_reader(path)?;
            resolver
                .for_each(|element| match element {
                    Element::Node(node) => {
                        network.resolve_pending_node(node.id(), node.lon(), node.lat());
                    }
                    Element::DenseNode(node) => {
                        network.resolve_pending_node(node.id(), node.lon(), node.lat());
                    }
                    Element::Way(_) | Element::Relation(_) => {}
                })
                .map_err(|source| PbfGraphProviderError::Decode {
                    source,
                    path: path.to_path_buf(),
                })?;
        }

        let network = network.finish();
        debug!(
            "loaded {} highway ways over {} nodes from {}",
            network.way_count(),
            network.node_count(),
            path.display()
        );
        Ok(Self { network })
    }

    /// Number of highway ways held in memory.
    #[must_use]
    pub fn way_count(&self) -> usize {
        self.network.way_count()
    }
}

impl GraphProvider for PbfGraphProvider {
    fn load_walking_graph(
        &self,
        bbox: &Rect<f64>,
        network_type: NetworkType,
    ) -> Result<WalkGraph, GraphProviderError> {
        let graph = self.network.walk_graph(bbox, network_type);
        if graph.is_empty() {
            return Err(GraphProviderError::EmptyArea);
        }
        debug!(
            "cut {} nodes and {} edges for {network_type:?} network",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

fn open_reader(path: &Path) -> Result<ElementReader<BufReader<File>>, PbfGraphProviderError> {
    ElementReader::from_path(path).map_err(|source| PbfGraphProviderError::Open {
        source,
        path: path.to_path_buf(),
    })
}
