//! Iterative avoidance relaxation.
//!
//! Routing starts by penalising every requested obstacle type. After each
//! search, types the route still passes within the radius of are dropped from
//! the active set and the search repeats. The loop ends when a route clears
//! every active type, or when no type is left to avoid; since each relaxing
//! round removes at least one type, at most `avoid_types.len() + 1` searches
//! run per request.

use std::collections::BTreeSet;

use geo::Rect;
use log::{debug, info, warn};
use wayfriend_core::distance::{bounding_box, haversine_m};
use wayfriend_core::{
    AvoidanceRequest, GraphProvider, ObstacleStore, RouteError, RouteResult, Router, WalkGraph,
};

use crate::config::RouterConfig;
use crate::encounter::check_encounters;
use crate::search::{FoundPath, NoPathError, find_path};
use crate::stats::{StatsReport, compute_stats};
use crate::weighting::WeightingEngine;

/// Snapshot of the relaxation loop between rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    /// One-based round number.
    pub round: usize,
    /// Types still penalised; always a subset of the requested types.
    pub active: BTreeSet<String>,
}

impl RoundState {
    /// First round, avoiding every requested type.
    #[must_use]
    pub fn initial(request: &AvoidanceRequest) -> Self {
        Self {
            round: 1,
            active: request.avoid_types.clone(),
        }
    }

    /// Next round with `failed` removed from the active set.
    #[must_use]
    pub fn relaxed(&self, failed: &BTreeSet<String>) -> Self {
        Self {
            round: self.round + 1,
            active: self.active.difference(failed).cloned().collect(),
        }
    }
}

/// Result of a single round.
#[derive(Debug)]
enum RoundOutcome {
    /// Start and end are not connected.
    NoPath(NoPathError),
    /// The route cleared every active type.
    Cleared(FoundPath),
    /// The route hit the listed active types.
    Failed(BTreeSet<String>),
}

/// Default [`Router`] combining a [`GraphProvider`] and an [`ObstacleStore`].
///
/// # Examples
/// ```
/// use geo::Coord;
/// use wayfriend_core::test_support::{FixedGraphProvider, MemoryObstacleStore};
/// use wayfriend_core::{AvoidanceRequest, Router};
/// use wayfriend_router::AvoidanceRouter;
///
/// let provider = FixedGraphProvider::line(&[(0.0, 0.0), (0.001, 0.0), (0.002, 0.0)]);
/// let router = AvoidanceRouter::new(provider, MemoryObstacleStore::default());
/// let request = AvoidanceRequest::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.002, y: 0.0 })
///     .with_avoid_types(["stairs"]);
///
/// let result = router.find_route(&request)?;
/// assert_eq!(result.route.len(), 3);
/// assert!(result.risk_factors.is_empty());
/// assert!(result.avoided_final.contains("stairs"));
/// # Ok::<(), wayfriend_core::RouteError>(())
/// ```
#[derive(Debug)]
pub struct AvoidanceRouter<G, S>
where
    G: GraphProvider,
    S: ObstacleStore,
{
    provider: G,
    store: S,
    config: RouterConfig,
}

impl<G, S> AvoidanceRouter<G, S>
where
    G: GraphProvider,
    S: ObstacleStore,
{
    /// Construct a router using default configuration.
    pub fn new(provider: G, store: S) -> Self {
        Self::with_config(provider, store, RouterConfig::default())
    }

    /// Construct a router with explicit configuration.
    pub const fn with_config(provider: G, store: S, config: RouterConfig) -> Self {
        Self {
            provider,
            store,
            config,
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn run_round(
        &self,
        graph: &mut WalkGraph,
        request: &AvoidanceRequest,
        bbox: &Rect<f64>,
        state: &RoundState,
    ) -> Result<RoundOutcome, RouteError> {
        let obstacles = if state.active.is_empty() {
            Vec::new()
        } else {
            self.store.query(&state.active, bbox)?
        };

        WeightingEngine::new(
            request,
            &state.active,
            &obstacles,
            self.config.vehicular_penalty,
        )
        .apply(graph);
        let path = match find_path(graph, request.start, request.end) {
            Ok(path) => path,
            Err(err) => return Ok(RoundOutcome::NoPath(err)),
        };

        let report = check_encounters(
            &path.coords,
            &obstacles,
            request.radius_m,
            self.config.segment_samples,
        );
        let failed: BTreeSet<String> = state
            .active
            .iter()
            .filter(|kind| report.count_for(kind) > 0)
            .cloned()
            .collect();
        debug!(
            "round {}: active {:?}, {} obstacles, failed {:?}",
            state.round,
            state.active,
            obstacles.len(),
            failed
        );

        if failed.is_empty() {
            Ok(RoundOutcome::Cleared(path))
        } else {
            Ok(RoundOutcome::Failed(failed))
        }
    }

    fn finish(
        &self,
        request: &AvoidanceRequest,
        bbox: &Rect<f64>,
        path: FoundPath,
        avoided_final: BTreeSet<String>,
    ) -> Result<RouteResult, RouteError> {
        let StatsReport {
            obstacle_stats,
            risk_factors,
        } = compute_stats(
            &path.coords,
            &request.avoid_types,
            bbox,
            request.radius_m,
            self.config.segment_samples,
            &self.store,
        )?;
        Ok(RouteResult {
            route: path.coords,
            distance_m: path.distance_m,
            risk_factors,
            avoided_final,
            obstacle_stats,
        })
    }
}

/// Straight line between the requested coordinates, returned when the graph
/// offers no connected path.
fn straight_line(request: &AvoidanceRequest, err: &NoPathError) -> RouteResult {
    warn!("no walkable path ({err}); returning straight-line fallback");
    RouteResult {
        route: vec![request.start, request.end],
        distance_m: haversine_m(request.start, request.end),
        risk_factors: request.avoid_types.clone(),
        avoided_final: BTreeSet::new(),
        obstacle_stats: StatsReport::zeroed(&request.avoid_types).obstacle_stats,
    }
}

/// Log a warning for every requested type the penalty table leaves at zero,
/// returning those types.
fn warn_unpenalised_types(request: &AvoidanceRequest) -> BTreeSet<String> {
    let unpenalised: BTreeSet<String> = request.unpenalised_types().map(str::to_owned).collect();
    for kind in &unpenalised {
        warn!("no penalty configured for obstacle type {kind:?}; it will not be avoided");
    }
    unpenalised
}

impl<G, S> Router for AvoidanceRouter<G, S>
where
    G: GraphProvider + Send + Sync,
    S: ObstacleStore + Send + Sync,
{
    fn find_route(&self, request: &AvoidanceRequest) -> Result<RouteResult, RouteError> {
        request.validate_with_span(self.config.max_span_deg)?;
        warn_unpenalised_types(request);

        let bbox = bounding_box(request.start, request.end, self.config.bbox_margin_deg);
        let mut graph = self
            .provider
            .load_walking_graph(&bbox, self.config.network_type)?;

        let mut state = RoundState::initial(request);
        loop {
            match self.run_round(&mut graph, request, &bbox, &state)? {
                RoundOutcome::NoPath(err) => return Ok(straight_line(request, &err)),
                RoundOutcome::Cleared(path) => {
                    info!(
                        "route cleared {:?} after {} round(s)",
                        state.active, state.round
                    );
                    return self.finish(request, &bbox, path, state.active);
                }
                RoundOutcome::Failed(failed) => {
                    let next = state.relaxed(&failed);
                    if next.active.is_empty() {
                        break;
                    }
                    state = next;
                }
            }
        }

        info!(
            "avoidance exhausted after {} round(s); routing without obstacle penalties",
            state.round
        );
        WeightingEngine::new(request, &BTreeSet::new(), &[], self.config.vehicular_penalty)
            .apply(&mut graph);
        match find_path(&graph, request.start, request.end) {
            Ok(path) => self.finish(request, &bbox, path, BTreeSet::new()),
            Err(err) => Ok(straight_line(request, &err)),
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests compare floating-point distances"
)]
mod tests {
    use super::*;
    use geo::Coord;
    use rstest::{fixture, rstest};
    use wayfriend_core::test_support::{
        FailingGraphProvider, FailingObstacleStore, FixedGraphProvider, MemoryObstacleStore,
        grid_graph,
    };
    use wayfriend_core::{AvoidanceRequestValidationError, Obstacle, ObstacleStats};

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    /// 3×3 lattice with 0.001° spacing anchored at the origin.
    #[fixture]
    fn grid() -> FixedGraphProvider {
        FixedGraphProvider::new(grid_graph(3, 3, 0.001, c(0.0, 0.0)))
    }

    const DETOUR_APEX: Coord<f64> = Coord { x: 0.001, y: 0.001 };

    /// Direct `primary` road from the origin to (0.002, 0) beside a footway
    /// detour through [`DETOUR_APEX`].
    #[fixture]
    fn primary_shortcut() -> FixedGraphProvider {
        let mut builder = wayfriend_core::WalkGraph::builder();
        builder.add_node(0, c(0.0, 0.0));
        builder.add_node(1, c(0.002, 0.0));
        builder.add_node(2, DETOUR_APEX);
        builder.add_edge(0, 1, None, Some("primary".to_owned()));
        builder.add_edge(0, 2, None, Some("footway".to_owned()));
        builder.add_edge(2, 1, None, Some("footway".to_owned()));
        FixedGraphProvider::new(builder.build())
    }

    #[rstest]
    fn round_state_shrinks_monotonically() {
        let request = AvoidanceRequest::new(c(0.0, 0.0), c(0.001, 0.0))
            .with_avoid_types(["curb", "stairs", "slope"]);
        let first = RoundState::initial(&request);
        let failed = BTreeSet::from(["stairs".to_owned(), "ramp".to_owned()]);
        let second = first.relaxed(&failed);
        assert_eq!(second.round, 2);
        assert_eq!(
            second.active,
            BTreeSet::from(["curb".to_owned(), "slope".to_owned()])
        );
        assert!(second.active.is_subset(&first.active));
    }

    #[rstest]
    fn detours_around_avoidable_obstacle(grid: FixedGraphProvider) {
        let store = MemoryObstacleStore::with_obstacles([Obstacle::new(1, "curb", c(0.0005, 0.0))]);
        let router = AvoidanceRouter::new(grid, store);
        let request = AvoidanceRequest::new(c(0.0, 0.0), c(0.002, 0.0)).with_avoid_types(["curb"]);

        let result = router.find_route(&request).expect("routing succeeds");

        assert_eq!(result.route.first(), Some(&c(0.0, 0.0)));
        assert_eq!(result.route.last(), Some(&c(0.002, 0.0)));
        assert!(result.route.len() > 3, "expected a detour, got {:?}", result.route);
        assert!(result.risk_factors.is_empty());
        assert_eq!(result.avoided_final, request.avoid_types);
        assert_eq!(
            result.obstacle_stats.get("curb"),
            Some(&ObstacleStats { total: 1, success: 1, failed: 0 })
        );
    }

    #[rstest]
    fn unavoidable_obstacle_exhausts_avoidance() {
        let provider = FixedGraphProvider::line(&[(0.0, 0.0), (0.001, 0.0), (0.002, 0.0)]);
        let store =
            MemoryObstacleStore::with_obstacles([Obstacle::new(7, "stairs", c(0.0015, 0.0))]);
        let router = AvoidanceRouter::new(provider, store);
        let request =
            AvoidanceRequest::new(c(0.0, 0.0), c(0.002, 0.0)).with_avoid_types(["stairs"]);

        let result = router.find_route(&request).expect("routing succeeds");

        assert_eq!(result.route.len(), 3);
        assert!(result.avoided_final.is_empty());
        assert!(result.risk_factors.contains("stairs"));
        let stairs = result.obstacle_stats.get("stairs").copied().unwrap_or_default();
        assert!(stairs.failed >= 1);
        assert!(stairs.is_consistent());
    }

    #[rstest]
    fn disconnected_graph_falls_back_to_straight_line() {
        let mut builder = wayfriend_core::WalkGraph::builder();
        builder.add_node(1, c(0.0, 0.0));
        builder.add_node(2, c(0.01, 0.0));
        let router = AvoidanceRouter::new(
            FixedGraphProvider::new(builder.build()),
            MemoryObstacleStore::default(),
        );
        let request = AvoidanceRequest::new(c(0.0001, 0.0), c(0.0099, 0.0))
            .with_avoid_types(["curb", "stairs"]);

        let result = router.find_route(&request).expect("fallback is not an error");

        assert_eq!(result.route, vec![request.start, request.end]);
        assert!((result.distance_m - haversine_m(request.start, request.end)).abs() < 1e-9);
        assert_eq!(result.risk_factors, request.avoid_types);
        assert!(result.avoided_final.is_empty());
        assert_eq!(result.obstacle_stats.len(), 2);
        assert!(
            result
                .obstacle_stats
                .values()
                .all(|stats| *stats == ObstacleStats::default())
        );
    }

    #[rstest]
    fn empty_avoid_set_never_queries_obstacles(grid: FixedGraphProvider) {
        let store = MemoryObstacleStore::with_obstacles([Obstacle::new(1, "curb", c(0.0005, 0.0))]);
        let router = AvoidanceRouter::new(grid, store);
        let request = AvoidanceRequest::new(c(0.0, 0.0), c(0.002, 0.0));

        let result = router.find_route(&request).expect("routing succeeds");

        assert_eq!(router.store.query_count(), 0);
        assert_eq!(result.route.len(), 3);
        assert!(result.risk_factors.is_empty());
        assert!(result.obstacle_stats.is_empty());
        assert!(result.avoided_final.is_empty());
    }

    #[rstest]
    fn validation_runs_before_loading_the_graph() {
        let router = AvoidanceRouter::new(FailingGraphProvider, FailingObstacleStore);
        let request =
            AvoidanceRequest::new(c(0.0, 0.0), c(0.001, 0.0)).with_radius(-1.0);
        let err = router.find_route(&request).expect_err("negative radius");
        assert!(matches!(
            err,
            RouteError::InvalidRequest(AvoidanceRequestValidationError::NonPositiveRadius(_))
        ));
    }

    #[rstest]
    fn span_limit_comes_from_config(grid: FixedGraphProvider) {
        let config = RouterConfig::default().with_max_span_deg(0.0001);
        let router = AvoidanceRouter::with_config(grid, MemoryObstacleStore::default(), config);
        let request = AvoidanceRequest::new(c(0.0, 0.0), c(0.002, 0.0));
        let err = router.find_route(&request).expect_err("span too large");
        assert!(matches!(
            err,
            RouteError::InvalidRequest(AvoidanceRequestValidationError::SpanTooLarge { .. })
        ));
    }

    #[rstest]
    fn provider_and_store_errors_propagate(grid: FixedGraphProvider) {
        let request =
            AvoidanceRequest::new(c(0.0, 0.0), c(0.002, 0.0)).with_avoid_types(["curb"]);

        let router = AvoidanceRouter::new(FailingGraphProvider, MemoryObstacleStore::default());
        assert!(matches!(router.find_route(&request), Err(RouteError::Graph(_))));

        let router = AvoidanceRouter::new(grid, FailingObstacleStore);
        assert!(matches!(router.find_route(&request), Err(RouteError::Obstacles(_))));
    }

    #[rstest]
    fn plain_route_prefers_footway_over_vehicular_shortcut(primary_shortcut: FixedGraphProvider) {
        let router = AvoidanceRouter::new(primary_shortcut, MemoryObstacleStore::default());
        let request = AvoidanceRequest::new(c(0.0, 0.0), c(0.002, 0.0));

        let result = router.find_route(&request).expect("routing succeeds");

        assert_eq!(result.route, vec![c(0.0, 0.0), DETOUR_APEX, c(0.002, 0.0)]);
        let detour = haversine_m(c(0.0, 0.0), DETOUR_APEX) + haversine_m(DETOUR_APEX, c(0.002, 0.0));
        assert!((result.distance_m - detour).abs() < 1e-6);
    }

    #[rstest]
    fn exhausted_reroute_keeps_vehicular_penalty(primary_shortcut: FixedGraphProvider) {
        let store =
            MemoryObstacleStore::with_obstacles([Obstacle::new(1, "stairs", c(0.0, 0.00001))]);
        let router = AvoidanceRouter::new(primary_shortcut, store);
        let request =
            AvoidanceRequest::new(c(0.0, 0.0), c(0.002, 0.0)).with_avoid_types(["stairs"]);

        let result = router.find_route(&request).expect("routing succeeds");

        assert_eq!(result.route, vec![c(0.0, 0.0), DETOUR_APEX, c(0.002, 0.0)]);
        assert!(result.avoided_final.is_empty());
        assert!(result.risk_factors.contains("stairs"));
    }

    #[rstest]
    fn unpenalised_types_are_reported() {
        let request = AvoidanceRequest::new(c(0.0, 0.0), c(0.002, 0.0))
            .with_avoid_types(["curb", "stairs"])
            .with_penalties([("stairs", 100.0)]);
        assert_eq!(
            warn_unpenalised_types(&request),
            BTreeSet::from(["curb".to_owned()])
        );

        let defaults = AvoidanceRequest::new(c(0.0, 0.0), c(0.002, 0.0))
            .with_avoid_types(["curb", "stairs"]);
        assert!(warn_unpenalised_types(&defaults).is_empty());
    }

    #[rstest]
    fn unpenalised_type_is_not_detoured(grid: FixedGraphProvider) {
        let store = MemoryObstacleStore::with_obstacles([Obstacle::new(1, "curb", c(0.0005, 0.0))]);
        let router = AvoidanceRouter::new(grid, store);
        let request = AvoidanceRequest::new(c(0.0, 0.0), c(0.002, 0.0))
            .with_avoid_types(["curb"])
            .with_penalties([("stairs", 100.0)]);

        let result = router.find_route(&request).expect("routing succeeds");

        assert_eq!(result.route, vec![c(0.0, 0.0), c(0.001, 0.0), c(0.002, 0.0)]);
        assert!(result.risk_factors.contains("curb"));
        assert!(result.avoided_final.is_empty());
    }
}
