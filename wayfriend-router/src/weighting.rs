//! Edge costs combining length, obstacle penalties and road class.
//!
//! An edge costs its length in metres plus, for every active obstacle within
//! the avoidance radius of the edge midpoint, that obstacle type's penalty.
//! Penalties are summed without capping, so two nearby curbs cost twice as
//! much as one. Edges on vehicular road classes always carry an extra fixed
//! cost, whatever the caller chose to avoid.

use std::collections::BTreeSet;

use geo::Coord;
use wayfriend_core::distance::{haversine_m, midpoint};
use wayfriend_core::{AvoidanceRequest, Obstacle, WalkEdge, WalkGraph};

/// Weighting rules for one relaxation round.
#[derive(Debug)]
pub struct WeightingEngine<'a> {
    obstacles: Vec<&'a Obstacle>,
    request: &'a AvoidanceRequest,
    vehicular_penalty: f64,
}

impl<'a> WeightingEngine<'a> {
    /// Build weighting rules that penalise `obstacles` whose type is in
    /// `active_types`, using the radius and penalty table of `request`.
    #[must_use]
    pub fn new(
        request: &'a AvoidanceRequest,
        active_types: &BTreeSet<String>,
        obstacles: &'a [Obstacle],
        vehicular_penalty: f64,
    ) -> Self {
        let obstacles = obstacles
            .iter()
            .filter(|obstacle| active_types.contains(&obstacle.kind))
            .collect();
        Self {
            obstacles,
            request,
            vehicular_penalty,
        }
    }

    /// Cost of traversing `edge` between `from` and `to`.
    ///
    /// When the edge has no length, the haversine distance between its
    /// endpoints is stored on it first.
    #[expect(
        clippy::float_arithmetic,
        reason = "edge cost is length plus additive penalties"
    )]
    pub fn edge_weight(&self, edge: &mut WalkEdge, from: Coord<f64>, to: Coord<f64>) -> f64 {
        let base = *edge.length_m.get_or_insert_with(|| haversine_m(from, to));
        let mid = midpoint(from, to);
        let obstacle_penalty: f64 = self
            .obstacles
            .iter()
            .filter(|obstacle| haversine_m(obstacle.location, mid) <= self.request.radius_m)
            .map(|obstacle| self.request.penalty_for(&obstacle.kind))
            .sum();
        let road_penalty = if edge.is_vehicular() {
            self.vehicular_penalty
        } else {
            0.0
        };
        base + obstacle_penalty + road_penalty
    }

    /// Recompute every edge weight of `graph`.
    pub fn apply(&self, graph: &mut WalkGraph) {
        graph.update_edges(|from, to, edge| {
            edge.weight = self.edge_weight(edge, from, to);
        });
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests compare floating-point costs"
)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const FROM: Coord<f64> = Coord { x: 0.0, y: 0.0 };
    const TO: Coord<f64> = Coord { x: 0.001, y: 0.0 };

    fn active(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[fixture]
    fn request() -> AvoidanceRequest {
        AvoidanceRequest::new(FROM, TO)
            .with_avoid_types(["curb", "stairs"])
            .with_penalties([("curb", 100.0), ("stairs", 1000.0)])
            .with_radius(5.0)
    }

    #[rstest]
    fn memoises_missing_length(request: AvoidanceRequest) {
        let engine = WeightingEngine::new(&request, &BTreeSet::new(), &[], 10_000.0);
        let mut edge = WalkEdge::new(None, None);
        let weight = engine.edge_weight(&mut edge, FROM, TO);
        let expected = haversine_m(FROM, TO);
        assert!((weight - expected).abs() < 1e-9);
        assert_eq!(edge.length_m, Some(weight));
    }

    #[rstest]
    fn sums_penalties_of_nearby_active_obstacles(request: AvoidanceRequest) {
        let mid = midpoint(FROM, TO);
        let obstacles = vec![
            Obstacle::new(1, "curb", mid),
            Obstacle::new(2, "curb", mid),
            Obstacle::new(3, "stairs", mid),
            Obstacle::new(4, "curb", Coord { x: 0.5, y: 0.5 }),
        ];
        let engine = WeightingEngine::new(&request, &active(&["curb"]), &obstacles, 10_000.0);
        let mut edge = WalkEdge::new(Some(50.0), None);
        assert_eq!(engine.edge_weight(&mut edge, FROM, TO), 250.0);
    }

    #[rstest]
    fn radius_boundary_is_inclusive(request: AvoidanceRequest) {
        let mid = midpoint(FROM, TO);
        let obstacle_at = Coord { x: mid.x, y: 0.0001 };
        let exact = haversine_m(obstacle_at, mid);
        let request = request.with_radius(exact);
        let obstacles = vec![Obstacle::new(1, "stairs", obstacle_at)];
        let engine = WeightingEngine::new(&request, &active(&["stairs"]), &obstacles, 0.0);
        let mut edge = WalkEdge::new(Some(10.0), None);
        assert_eq!(engine.edge_weight(&mut edge, FROM, TO), 1010.0);
    }

    #[rstest]
    #[case(Some("primary"), 10_010.0)]
    #[case(Some("trunk_link"), 10_010.0)]
    #[case(Some("footway"), 10.0)]
    #[case(None, 10.0)]
    fn vehicular_penalty_ignores_active_types(
        request: AvoidanceRequest,
        #[case] class: Option<&str>,
        #[case] expected: f64,
    ) {
        let engine = WeightingEngine::new(&request, &BTreeSet::new(), &[], 10_000.0);
        let mut edge = WalkEdge::new(Some(10.0), class.map(str::to_owned));
        assert_eq!(engine.edge_weight(&mut edge, FROM, TO), expected);
    }

    #[rstest]
    fn unlisted_type_weighs_nothing(request: AvoidanceRequest) {
        let request = request.with_penalties([("curb", 100.0)]);
        let obstacles = vec![Obstacle::new(1, "stairs", midpoint(FROM, TO))];
        let engine = WeightingEngine::new(&request, &active(&["stairs"]), &obstacles, 0.0);
        let mut edge = WalkEdge::new(Some(10.0), None);
        assert_eq!(engine.edge_weight(&mut edge, FROM, TO), 10.0);
    }

    #[rstest]
    fn apply_reweights_every_edge(request: AvoidanceRequest) {
        let mut graph = wayfriend_core::test_support::line_graph(&[(0.0, 0.0), (0.001, 0.0)]);
        let obstacles = vec![Obstacle::new(1, "curb", midpoint(FROM, TO))];
        WeightingEngine::new(&request, &active(&["curb"]), &obstacles, 0.0).apply(&mut graph);
        let weights: Vec<f64> = graph.graph().edge_weights().map(|e| e.weight).collect();
        let expected = haversine_m(FROM, TO) + 100.0;
        assert_eq!(weights.len(), 1);
        assert!(weights.iter().all(|w| (w - expected).abs() < 1e-9));
    }
}
