//! A* search over a weighted [`WalkGraph`].

use geo::Coord;
use petgraph::algo::astar;
use thiserror::Error;
use wayfriend_core::distance::haversine_m;
use wayfriend_core::{NodeIndex, WalkEdge, WalkGraph};

/// Raised when no path joins the nodes nearest to start and end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoPathError {
    /// The graph has no nodes to snap to.
    #[error("the walking graph is empty")]
    EmptyGraph,
    /// Start and end snapped to nodes in different components.
    #[error("no walkable path between node {from} and node {to}")]
    Disconnected {
        /// Source id of the node nearest the start.
        from: u64,
        /// Source id of the node nearest the end.
        to: u64,
    },
}

/// A path found by [`find_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct FoundPath {
    /// Node sequence from the start node to the end node.
    pub nodes: Vec<NodeIndex>,
    /// Node positions in path order.
    pub coords: Vec<Coord<f64>>,
    /// Sum of traversed edge lengths in metres.
    pub distance_m: f64,
    /// Sum of traversed edge weights.
    pub cost: f64,
}

/// Find the cheapest path between the nodes nearest `start` and `end`.
///
/// Edge cost is the weight assigned by the last weighting pass; the
/// heuristic is the haversine distance to the end node, which never
/// overestimates as long as edge weights are at least their geometric
/// length. When several paths share the lowest cost, which one is returned
/// is unspecified.
///
/// # Errors
/// Returns [`NoPathError`] if the graph is empty or the snapped nodes are
/// not connected.
pub fn find_path(
    graph: &WalkGraph,
    start: Coord<f64>,
    end: Coord<f64>,
) -> Result<FoundPath, NoPathError> {
    let source = graph.nearest_node(start).ok_or(NoPathError::EmptyGraph)?;
    let target = graph.nearest_node(end).ok_or(NoPathError::EmptyGraph)?;
    let goal = graph.location(target).ok_or(NoPathError::EmptyGraph)?;

    let (cost, nodes) = astar(
        graph.graph(),
        source,
        |node| node == target,
        |edge| edge.weight().weight,
        |node| graph.location(node).map_or(0.0, |at| haversine_m(at, goal)),
    )
    .ok_or_else(|| NoPathError::Disconnected {
        from: graph.node(source).map_or(0, |node| node.id),
        to: graph.node(target).map_or(0, |node| node.id),
    })?;

    let coords = nodes
        .iter()
        .filter_map(|idx| graph.location(*idx))
        .collect();
    let distance_m = path_length(graph, &nodes);

    Ok(FoundPath {
        nodes,
        coords,
        distance_m,
        cost,
    })
}

/// Sum of edge lengths along `nodes`.
///
/// Between parallel edges the one the search would take counts: lowest
/// weight first, then lowest length.
fn path_length(graph: &WalkGraph, nodes: &[NodeIndex]) -> f64 {
    nodes
        .windows(2)
        .filter_map(|pair| match pair {
            [a, b] => step_length(graph, *a, *b),
            _ => None,
        })
        .sum()
}

fn step_length(graph: &WalkGraph, a: NodeIndex, b: NodeIndex) -> Option<f64> {
    let edge = graph
        .graph()
        .edges_connecting(a, b)
        .map(|edge| edge.weight())
        .min_by(|lhs, rhs| {
            lhs.weight
                .total_cmp(&rhs.weight)
                .then_with(|| length_or_zero(lhs).total_cmp(&length_or_zero(rhs)))
        })?;
    let length = match edge.length_m {
        Some(length) => length,
        None => haversine_m(graph.location(a)?, graph.location(b)?),
    };
    Some(length)
}

fn length_or_zero(edge: &WalkEdge) -> f64 {
    edge.length_m.unwrap_or_default()
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests compare floating-point distances"
)]
mod tests {
    use super::*;
    use rstest::rstest;
    use wayfriend_core::test_support::{grid_graph, line_graph};

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[rstest]
    fn empty_graph_has_no_path() {
        let graph = WalkGraph::builder().build();
        assert_eq!(
            find_path(&graph, c(0.0, 0.0), c(1.0, 1.0)),
            Err(NoPathError::EmptyGraph)
        );
    }

    #[rstest]
    fn disconnected_nodes_have_no_path() {
        let mut builder = WalkGraph::builder();
        builder.add_node(1, c(0.0, 0.0));
        builder.add_node(2, c(0.01, 0.0));
        let graph = builder.build();
        assert_eq!(
            find_path(&graph, c(0.0, 0.0), c(0.01, 0.0)),
            Err(NoPathError::Disconnected { from: 1, to: 2 })
        );
    }

    #[rstest]
    fn snaps_to_nearest_nodes() {
        let graph = grid_graph(3, 3, 0.001, c(0.0, 0.0));
        let path = find_path(&graph, c(-0.0001, 0.00005), c(0.0021, 0.0019)).expect("grid is connected");
        assert_eq!(path.coords.first(), Some(&c(0.0, 0.0)));
        assert_eq!(path.coords.last(), Some(&c(0.002, 0.002)));
        assert_eq!(path.nodes.len(), 5);
    }

    #[rstest]
    fn distance_ignores_weights() {
        let mut graph = grid_graph(2, 2, 0.001, c(0.0, 0.0));
        graph.update_edges(|_, _, edge| edge.weight = edge.length_m.unwrap_or_default() + 500.0);
        let path = find_path(&graph, c(0.0, 0.0), c(0.001, 0.001)).expect("grid is connected");
        let lengths: f64 = path
            .nodes
            .windows(2)
            .filter_map(|pair| match pair {
                [a, b] => graph.graph().find_edge(*a, *b),
                _ => None,
            })
            .filter_map(|edge| graph.graph().edge_weight(edge))
            .filter_map(|edge| edge.length_m)
            .sum();
        assert!((path.distance_m - lengths).abs() < 1e-9);
        assert!((path.cost - (lengths + 1000.0)).abs() < 1e-6);
    }

    #[rstest]
    fn avoids_heavy_edges() {
        // Square 0-1-3 / 0-2-3; make the 0-1 edge expensive.
        let mut graph = grid_graph(2, 2, 0.001, c(0.0, 0.0));
        graph.update_edges(|from, to, edge| {
            let base = edge.length_m.unwrap_or_default();
            let touches_east = from == c(0.001, 0.0) || to == c(0.001, 0.0);
            edge.weight = if touches_east { base + 5_000.0 } else { base };
        });
        let path = find_path(&graph, c(0.0, 0.0), c(0.001, 0.001)).expect("grid is connected");
        assert!(!path.coords.contains(&c(0.001, 0.0)));
    }

    #[rstest]
    fn parallel_edges_use_the_lightest() {
        let mut builder = WalkGraph::builder();
        builder.add_node(1, c(0.0, 0.0));
        builder.add_node(2, c(0.001, 0.0));
        builder.add_edge(1, 2, Some(300.0), None);
        builder.add_edge(1, 2, Some(120.0), None);
        let mut graph = builder.build();
        graph.update_edges(|_, _, edge| edge.weight = edge.length_m.unwrap_or_default());
        let path = find_path(&graph, c(0.0, 0.0), c(0.001, 0.0)).expect("nodes are connected");
        assert!((path.distance_m - 120.0).abs() < 1e-9);
    }

    #[rstest]
    fn same_snapped_node_yields_single_point() {
        let graph = line_graph(&[(0.0, 0.0), (0.001, 0.0)]);
        let path = find_path(&graph, c(0.0, 0.0), c(0.0001, 0.0)).expect("same node");
        assert_eq!(path.coords, vec![c(0.0, 0.0)]);
        assert_eq!(path.distance_m, 0.0);
    }
}
