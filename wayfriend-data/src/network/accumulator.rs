//! Highway way accumulator for OSM PBF network loading.
//!
//! The first pass collects highway ways and the node references they need;
//! the second pass resolves those references to coordinates. The result is
//! kept in memory and cut into bbox-restricted walk graphs on demand.
use std::collections::{HashMap, HashSet};

use geo::{Coord, Rect};
use log::warn;
use osmpbf::Element;
use wayfriend_core::{NetworkType, WalkGraph, distance::haversine_m};

use super::filter::{HighwayTags, classify_way};

#[derive(Debug, Default)]
pub(super) struct WayNetwork {
    nodes: HashMap<u64, Coord<f64>>,
    pending_nodes: HashSet<u64>,
    ways: Vec<HighwayWay>,
}

#[derive(Debug, Clone, PartialEq)]
struct HighwayWay {
    node_refs: Vec<u64>,
    tags: HighwayTags,
}

impl WayNetwork {
    pub(super) fn process_element(&mut self, element: Element<'_>) {
        if let Element::Way(way) = element {
            let Some(tags) = classify_way(way.tags()) else {
                return;
            };
            let node_refs = way.refs().filter_map(encode_node_id).collect();
            self.insert_way(node_refs, tags);
        }
    }

    fn insert_way(&mut self, node_refs: Vec<u64>, tags: HighwayTags) {
        self.pending_nodes.extend(
            node_refs
                .iter()
                .filter(|node_id| !self.nodes.contains_key(node_id)),
        );
        self.ways.push(HighwayWay { node_refs, tags });
    }

    pub(super) fn combine(mut self, other: Self) -> Self {
        for (id, coord) in other.nodes {
            self.nodes.entry(id).or_insert(coord);
        }
        self.ways.extend(other.ways);
        self.pending_nodes.extend(other.pending_nodes);
        self.pending_nodes
            .retain(|node_id| !self.nodes.contains_key(node_id));
        self
    }

    pub(super) fn resolve_pending_node(&mut self, raw_id: i64, lon: f64, lat: f64) {
        let Some(node_id) = encode_node_id(raw_id) else {
            return;
        };
        if !self.pending_nodes.remove(&node_id) {
            return;
        }
        if let Some(location) = validated_coord(lon, lat) {
            self.nodes.insert(node_id, location);
        }
    }

    pub(super) fn pending_node_count(&self) -> usize {
        self.pending_nodes.len()
    }

    /// Report ways whose references never resolved and release the pending
    /// set. Segments touching unresolved nodes are skipped when graphs are
    /// built.
    pub(super) fn finish(mut self) -> Self {
        let incomplete = self
            .ways
            .iter()
            .filter(|way| {
                way.node_refs
                    .iter()
                    .any(|node_id| !self.nodes.contains_key(node_id))
            })
            .count();
        if incomplete > 0 {
            warn!("{incomplete} highway ways reference nodes without coordinates");
        }
        self.pending_nodes.clear();
        self
    }

    pub(super) fn way_count(&self) -> usize {
        self.ways.len()
    }

    pub(super) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Build the walk graph of consecutive way nodes inside `bbox`.
    ///
    /// Segments with an endpoint outside the box are dropped; the result is
    /// restricted to its largest connected component.
    pub(super) fn walk_graph(&self, bbox: &Rect<f64>, network_type: NetworkType) -> WalkGraph {
        let mut builder = WalkGraph::builder();
        let ways = self
            .ways
            .iter()
            .filter(|way| network_type == NetworkType::All || way.tags.walkable);
        for way in ways {
            for pair in way.node_refs.windows(2) {
                let [from, to] = pair else {
                    continue;
                };
                if from == to {
                    continue;
                }
                let (Some(a), Some(b)) = (self.located_in(*from, bbox), self.located_in(*to, bbox))
                else {
                    continue;
                };
                builder.add_node(*from, a);
                builder.add_node(*to, b);
                builder.add_edge(
                    *from,
                    *to,
                    Some(haversine_m(a, b)),
                    Some(way.tags.highway.clone()),
                );
            }
        }
        builder.build().retain_largest_component()
    }

    fn located_in(&self, node_id: u64, bbox: &Rect<f64>) -> Option<Coord<f64>> {
        let location = self.nodes.get(&node_id).copied()?;
        let (min, max) = (bbox.min(), bbox.max());
        (min.x <= location.x && location.x <= max.x && min.y <= location.y && location.y <= max.y)
            .then_some(location)
    }
}

fn encode_node_id(raw_id: i64) -> Option<u64> {
    u64::try_from(raw_id)
        .inspect_err(|_| {
            warn!("Skipped OSM node reference {raw_id} (negative identifiers are unsupported)");
        })
        .ok()
}

fn validated_coord(lon: f64, lat: f64) -> Option<Coord<f64>> {
    (lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat))
    .then_some(Coord { x: lon, y: lat })
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn bbox(min: (f64, f64), max: (f64, f64)) -> Rect<f64> {
        Rect::new(Coord { x: min.0, y: min.1 }, Coord { x: max.0, y: max.1 })
    }

    fn everywhere() -> Rect<f64> {
        bbox((-1.0, -1.0), (1.0, 1.0))
    }

    /// A footway 1-2-3, a motorway 3-4 and a private service road 4-5.
    #[fixture]
    fn network() -> WayNetwork {
        WayNetwork::default()
            .with_way(&[1, 2, 3], &[("highway", "footway")])
            .with_way(&[3, 4], &[("highway", "motorway")])
            .with_way(&[4, 5], &[("highway", "service"), ("access", "private")])
            .with_node(1, 0.0, 0.0)
            .with_node(2, 0.001, 0.0)
            .with_node(3, 0.002, 0.0)
            .with_node(4, 0.003, 0.0)
            .with_node(5, 0.004, 0.0)
            .finish()
    }

    #[rstest]
    fn walk_network_drops_unwalkable_ways(network: WayNetwork) {
        let graph = network.walk_graph(&everywhere(), NetworkType::Walk);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[rstest]
    fn all_network_keeps_every_highway(network: WayNetwork) {
        let graph = network.walk_graph(&everywhere(), NetworkType::All);
        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 4);
        let classes: Vec<_> = graph
            .graph()
            .edge_weights()
            .filter_map(|edge| edge.road_class.clone())
            .collect();
        assert!(classes.iter().any(|class| class == "motorway"));
    }

    #[rstest]
    fn edges_carry_haversine_lengths(network: WayNetwork) {
        let graph = network.walk_graph(&everywhere(), NetworkType::Walk);
        let expected = haversine_m(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.001, y: 0.0 });
        let first = graph
            .graph()
            .edge_weights()
            .next()
            .and_then(|edge| edge.length_m)
            .expect("edge length");
        assert!((first - expected).abs() < 1e-9);
    }

    #[rstest]
    fn segments_leaving_the_box_are_dropped(network: WayNetwork) {
        let graph = network.walk_graph(
            &bbox((-0.0005, -0.0005), (0.0015, 0.0005)),
            NetworkType::Walk,
        );
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[rstest]
    fn boundary_nodes_are_inside(network: WayNetwork) {
        let graph = network.walk_graph(&bbox((0.0, 0.0), (0.002, 0.0)), NetworkType::Walk);
        assert_eq!(graph.node_count(), 3);
    }

    #[rstest]
    fn keeps_largest_component() {
        let network = WayNetwork::default()
            .with_way(&[1, 2, 3], &[("highway", "footway")])
            .with_way(&[10, 11], &[("highway", "path")])
            .with_node(1, 0.0, 0.0)
            .with_node(2, 0.001, 0.0)
            .with_node(3, 0.002, 0.0)
            .with_node(10, 0.0, 0.01)
            .with_node(11, 0.001, 0.01)
            .finish();
        let graph = network.walk_graph(&everywhere(), NetworkType::Walk);
        assert_eq!(graph.node_count(), 3);
    }

    #[rstest]
    fn segments_with_unresolved_nodes_are_skipped() {
        let network = WayNetwork::default()
            .with_way(&[1, 2, 3], &[("highway", "footway")])
            .with_node(1, 0.0, 0.0)
            .with_node(3, 0.002, 0.0);
        assert_eq!(network.pending_node_count(), 1);
        let network = network.finish();
        assert_eq!(network.node_count(), 2);
        assert!(network.walk_graph(&everywhere(), NetworkType::Walk).is_empty());
    }

    #[rstest]
    fn invalid_coordinates_stay_unresolved() {
        let network = WayNetwork::default()
            .with_way(&[1, 2], &[("highway", "footway")])
            .with_node(1, 0.0, 0.0)
            .with_node(2, 200.0, 0.0)
            .finish();
        assert_eq!(network.node_count(), 1);
        assert!(network.walk_graph(&everywhere(), NetworkType::Walk).is_empty());
    }

    #[rstest]
    fn combine_merges_partial_results() {
        let left = WayNetwork::default().with_way(&[1, 2], &[("highway", "footway")]);
        let right = WayNetwork::default().with_way(&[2, 3], &[("highway", "steps")]);
        let merged = left
            .combine(right)
            .with_node(1, 0.0, 0.0)
            .with_node(2, 0.001, 0.0)
            .with_node(3, 0.002, 0.0)
            .finish();
        assert_eq!(merged.way_count(), 2);
        assert_eq!(
            merged.walk_graph(&everywhere(), NetworkType::Walk).edge_count(),
            2
        );
    }
}
