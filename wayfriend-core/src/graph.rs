//! In-memory walking network for a single routing request.
//!
//! The graph is undirected: pedestrians can walk every way in both
//! directions. Topology is fixed once a [`WalkGraph`] is built; only edge
//! attributes (memoised lengths and transient weights) may change afterwards.

use std::collections::HashMap;
use std::fmt;

use geo::Coord;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use rstar::RTree;
use rstar::primitives::GeomWithData;

/// Road classes oriented towards motor vehicles. Edges tagged with one of
/// these are penalised regardless of the caller's avoid set.
pub const VEHICULAR_ROAD_CLASSES: [&str; 10] = [
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "secondary",
    "secondary_link",
    "tertiary",
    "tertiary_link",
];

/// Graph vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkNode {
    /// Source identifier, e.g. an OSM node id.
    pub id: u64,
    /// Node position; `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
}

/// Walkable segment between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkEdge {
    /// Segment length in metres, if the source supplied one.
    pub length_m: Option<f64>,
    /// Road class tag such as `"footway"` or `"primary"`.
    pub road_class: Option<String>,
    /// Search cost assigned by the most recent weighting pass.
    pub weight: f64,
}

impl WalkEdge {
    /// Create an edge with an optional length and road class.
    #[must_use]
    pub fn new(length_m: Option<f64>, road_class: Option<String>) -> Self {
        Self {
            length_m,
            road_class,
            weight: length_m.unwrap_or(0.0),
        }
    }

    /// Whether the road class belongs to [`VEHICULAR_ROAD_CLASSES`].
    #[must_use]
    pub fn is_vehicular(&self) -> bool {
        self.road_class
            .as_deref()
            .is_some_and(|class| VEHICULAR_ROAD_CLASSES.contains(&class))
    }
}

type NodeEntry = GeomWithData<[f64; 2], NodeIndex>;

/// Walking network with a nearest-node index.
#[derive(Clone)]
pub struct WalkGraph {
    graph: UnGraph<WalkNode, WalkEdge>,
    index: RTree<NodeEntry>,
}

impl fmt::Debug for WalkGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkGraph")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish_non_exhaustive()
    }
}

impl WalkGraph {
    fn from_graph(graph: UnGraph<WalkNode, WalkEdge>) -> Self {
        let entries = graph
            .node_indices()
            .map(|idx| {
                let location = graph[idx].location;
                GeomWithData::new([location.x, location.y], idx)
            })
            .collect();
        Self {
            graph,
            index: RTree::bulk_load(entries),
        }
    }

    /// Start building a graph.
    #[must_use]
    pub fn builder() -> WalkGraphBuilder {
        WalkGraphBuilder::default()
    }

    /// Underlying `petgraph` graph.
    #[must_use]
    pub const fn graph(&self) -> &UnGraph<WalkNode, WalkEdge> {
        &self.graph
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Node at `idx`, if any.
    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> Option<&WalkNode> {
        self.graph.node_weight(idx)
    }

    /// Position of the node at `idx`, if any.
    #[must_use]
    pub fn location(&self, idx: NodeIndex) -> Option<Coord<f64>> {
        self.graph.node_weight(idx).map(|node| node.location)
    }

    /// Node closest to `coord` by straight-line distance in lon/lat space.
    ///
    /// Returns `None` only for an empty graph.
    #[must_use]
    pub fn nearest_node(&self, coord: Coord<f64>) -> Option<NodeIndex> {
        self.index
            .nearest_neighbor(&[coord.x, coord.y])
            .map(|entry| entry.data)
    }

    /// Visit every edge with its endpoint positions, allowing attribute
    /// updates. Topology cannot change through this method.
    pub fn update_edges<F>(&mut self, mut visit: F)
    where
        F: FnMut(Coord<f64>, Coord<f64>, &mut WalkEdge),
    {
        for edge_idx in self.graph.edge_indices() {
            let Some((a, b)) = self.graph.edge_endpoints(edge_idx) else {
                continue;
            };
            let (Some(from), Some(to)) = (self.location(a), self.location(b)) else {
                continue;
            };
            if let Some(edge) = self.graph.edge_weight_mut(edge_idx) {
                visit(from, to, edge);
            }
        }
    }

    /// Keep only the largest connected component.
    ///
    /// Ties between equally sized components go to the one containing the
    /// lowest node index.
    #[must_use]
    pub fn retain_largest_component(self) -> Self {
        let node_count = self.graph.node_count();
        if node_count == 0 {
            return self;
        }

        let mut components = UnionFind::<usize>::new(node_count);
        for edge in self.graph.raw_edges() {
            components.union(edge.source().index(), edge.target().index());
        }

        let labels = components.into_labeling();
        let mut sizes: HashMap<usize, usize> = HashMap::new();
        for label in &labels {
            *sizes.entry(*label).or_default() += 1;
        }

        let mut best: Option<(usize, usize)> = None;
        for label in &labels {
            let size = sizes.get(label).copied().unwrap_or_default();
            if best.is_none_or(|(_, best_size)| size > best_size) {
                best = Some((*label, size));
            }
        }
        let Some((keep, kept)) = best else {
            return self;
        };
        if kept == node_count {
            return self;
        }

        log::debug!("retaining largest component: {kept} of {node_count} nodes");
        let filtered = self.graph.filter_map(
            |idx, node| (labels.get(idx.index()) == Some(&keep)).then(|| node.clone()),
            |_, edge| Some(edge.clone()),
        );
        Self::from_graph(filtered)
    }
}

/// Incremental [`WalkGraph`] constructor keyed by source node identifiers.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use wayfriend_core::WalkGraph;
///
/// let mut builder = WalkGraph::builder();
/// builder.add_node(1, Coord { x: 0.0, y: 0.0 });
/// builder.add_node(2, Coord { x: 0.001, y: 0.0 });
/// assert!(builder.add_edge(1, 2, Some(111.0), Some("footway".into())));
/// assert!(!builder.add_edge(1, 99, None, None));
///
/// let graph = builder.build();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct WalkGraphBuilder {
    graph: UnGraph<WalkNode, WalkEdge>,
    ids: HashMap<u64, NodeIndex>,
}

impl WalkGraphBuilder {
    /// Add a node, returning the existing index when `id` is already known.
    pub fn add_node(&mut self, id: u64, location: Coord<f64>) -> NodeIndex {
        if let Some(idx) = self.ids.get(&id) {
            return *idx;
        }
        let idx = self.graph.add_node(WalkNode { id, location });
        self.ids.insert(id, idx);
        idx
    }

    /// Connect two known nodes. Returns `false` if either id is unknown.
    pub fn add_edge(
        &mut self,
        from: u64,
        to: u64,
        length_m: Option<f64>,
        road_class: Option<String>,
    ) -> bool {
        let (Some(a), Some(b)) = (self.ids.get(&from), self.ids.get(&to)) else {
            return false;
        };
        self.graph.add_edge(*a, *b, WalkEdge::new(length_m, road_class));
        true
    }

    /// Whether a node with `id` was added.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains_key(&id)
    }

    /// Finish construction and build the nearest-node index.
    #[must_use]
    pub fn build(self) -> WalkGraph {
        WalkGraph::from_graph(self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn coord(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    /// A three-node path plus a disconnected pair.
    #[fixture]
    fn split_graph() -> WalkGraph {
        let mut builder = WalkGraph::builder();
        builder.add_node(1, coord(0.0, 0.0));
        builder.add_node(2, coord(0.001, 0.0));
        builder.add_node(3, coord(0.002, 0.0));
        builder.add_node(10, coord(0.0, 0.01));
        builder.add_node(11, coord(0.001, 0.01));
        builder.add_edge(1, 2, Some(111.0), None);
        builder.add_edge(2, 3, Some(111.0), Some("primary".into()));
        builder.add_edge(10, 11, Some(111.0), None);
        builder.build()
    }

    #[rstest]
    fn nearest_node_snaps_to_closest(split_graph: WalkGraph) {
        let idx = split_graph
            .nearest_node(coord(0.0019, 0.0001))
            .expect("graph is not empty");
        assert_eq!(split_graph.node(idx).map(|n| n.id), Some(3));
    }

    #[rstest]
    fn nearest_node_on_empty_graph_is_none() {
        let graph = WalkGraph::builder().build();
        assert!(graph.is_empty());
        assert!(graph.nearest_node(coord(0.0, 0.0)).is_none());
    }

    #[rstest]
    fn largest_component_drops_islands(split_graph: WalkGraph) {
        let graph = split_graph.retain_largest_component();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let idx = graph
            .nearest_node(coord(0.0, 0.01))
            .expect("graph is not empty");
        assert_eq!(graph.node(idx).map(|n| n.id), Some(1));
    }

    #[rstest]
    fn builder_deduplicates_nodes() {
        let mut builder = WalkGraph::builder();
        let first = builder.add_node(5, coord(1.0, 1.0));
        let second = builder.add_node(5, coord(2.0, 2.0));
        assert_eq!(first, second);
        assert!(builder.contains(5));
        assert_eq!(builder.build().node_count(), 1);
    }

    #[rstest]
    #[case(Some("primary"), true)]
    #[case(Some("tertiary_link"), true)]
    #[case(Some("footway"), false)]
    #[case(Some("residential"), false)]
    #[case(None, false)]
    fn vehicular_classes_are_recognised(#[case] class: Option<&str>, #[case] expected: bool) {
        let edge = WalkEdge::new(Some(1.0), class.map(str::to_owned));
        assert_eq!(edge.is_vehicular(), expected);
    }

    #[rstest]
    fn update_edges_sees_endpoints(mut split_graph: WalkGraph) {
        split_graph.update_edges(|from, to, edge| {
            edge.weight = (to.x - from.x).abs() + (to.y - from.y).abs();
        });
        let total: f64 = split_graph
            .graph()
            .edge_weights()
            .map(|edge| edge.weight)
            .sum();
        assert!((total - 0.003).abs() < 1e-12);
    }
}
