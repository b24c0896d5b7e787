//! Focused unit tests covering route CLI configuration and request parsing.

use super::helpers::{Workspace, write_utf8};
use super::*;
use crate::route::{
    NetworkArg, RouteConfig, config_from_layers_for_test, load_route_request,
};
use camino::Utf8Path;
use geo::Coord;
use rstest::rstest;
use wayfriend_core::{AvoidanceRequest, NetworkType};
use wayfriend_router::RouterConfig;

#[derive(Debug, Copy, Clone)]
enum MissingInput {
    Request,
    OsmPbf,
    ObstaclesDb,
}

fn complete_args(workspace: &Workspace) -> RouteArgs {
    RouteArgs {
        request_path: Some(workspace.path("request.json")),
        osm_pbf: Some(workspace.path("area.osm.pbf")),
        obstacles_db: Some(workspace.path("obstacles.db")),
        ..RouteArgs::default()
    }
}

#[rstest]
#[case::request(MissingInput::Request, ARG_ROUTE_REQUEST, ENV_ROUTE_REQUEST)]
#[case::osm(MissingInput::OsmPbf, ARG_OSM_PBF, ENV_ROUTE_OSM_PBF)]
#[case::db(MissingInput::ObstaclesDb, ARG_OBSTACLES_DB, ENV_ROUTE_OBSTACLES_DB)]
fn converting_without_required_fields_errors(
    #[case] missing: MissingInput,
    #[case] expected_field: &'static str,
    #[case] expected_env: &'static str,
) {
    let workspace = Workspace::new();
    let mut args = complete_args(&workspace);
    match missing {
        MissingInput::Request => args.request_path = None,
        MissingInput::OsmPbf => args.osm_pbf = None,
        MissingInput::ObstaclesDb => args.obstacles_db = None,
    }

    let err = RouteConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, expected_field);
            assert_eq!(env, expected_env);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn defaults_router_configuration() {
    let workspace = Workspace::new();
    let config = RouteConfig::try_from(complete_args(&workspace)).expect("config should build");
    assert_eq!(config.router, RouterConfig::default());
}

#[rstest]
fn applies_margin_and_network_flags() {
    let workspace = Workspace::new();
    let args = RouteArgs {
        bbox_margin_deg: Some(0.005),
        network: Some(NetworkArg::All),
        ..complete_args(&workspace)
    };
    let config = RouteConfig::try_from(args).expect("config should build");
    assert_eq!(config.router.bbox_margin_deg, 0.005);
    assert_eq!(config.router.network_type, NetworkType::All);
}

#[rstest]
#[case(-0.01)]
#[case(f64::NAN)]
#[case(f64::INFINITY)]
fn rejects_invalid_margin(#[case] margin: f64) {
    let workspace = Workspace::new();
    let args = RouteArgs {
        bbox_margin_deg: Some(margin),
        ..complete_args(&workspace)
    };
    let err = RouteConfig::try_from(args).expect_err("invalid margin should error");
    assert!(matches!(err, CliError::InvalidBboxMargin { .. }));
}

#[rstest]
#[case::request(MissingInput::Request, ARG_ROUTE_REQUEST)]
#[case::osm(MissingInput::OsmPbf, ARG_OSM_PBF)]
#[case::db(MissingInput::ObstaclesDb, ARG_OBSTACLES_DB)]
fn validate_sources_reports_missing_inputs(
    #[case] missing: MissingInput,
    #[case] expected_field: &'static str,
) {
    let workspace = Workspace::new();
    let config = RouteConfig::try_from(complete_args(&workspace)).expect("config should build");
    if !matches!(missing, MissingInput::Request) {
        write_utf8(&config.request_path, b"{}");
    }
    if !matches!(missing, MissingInput::OsmPbf) {
        write_utf8(&config.osm_pbf, b"pbf");
    }
    if !matches!(missing, MissingInput::ObstaclesDb) {
        write_utf8(&config.obstacles_db, b"db");
    }

    let err = config.validate_sources().expect_err("expected failure");
    match err {
        CliError::MissingSourceFile { field, .. } => assert_eq!(field, expected_field),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[rstest]
fn validate_sources_reports_not_file() {
    let workspace = Workspace::new();
    let config = RouteConfig::try_from(complete_args(&workspace)).expect("config should build");
    std::fs::create_dir(config.request_path.as_std_path()).expect("request directory");

    let err = config
        .validate_sources()
        .expect_err("expected directory path to fail validation");
    match err {
        CliError::SourcePathNotFile { field, path } => {
            assert_eq!(field, ARG_ROUTE_REQUEST);
            assert_eq!(path, config.request_path);
        }
        other => panic!("expected SourcePathNotFile, found {other:?}"),
    }
}

#[rstest]
fn load_route_request_parses_json() {
    let workspace = Workspace::new();
    let path = workspace.path("request.json");
    write_utf8(
        &path,
        br#"{
            "start": {"x": 126.6500, "y": 37.3700},
            "end": {"x": 126.6550, "y": 37.3720},
            "avoid_types": ["curb", "stairs"],
            "radius_m": 15.0
        }"#,
    );

    let request = load_route_request(&path).expect("request should parse");
    let expected = AvoidanceRequest::new(
        Coord { x: 126.65, y: 37.37 },
        Coord { x: 126.655, y: 37.372 },
    )
    .with_avoid_types(["curb", "stairs"])
    .with_radius(15.0);
    assert_eq!(request, expected);
}

#[rstest]
fn load_route_request_io_error_returns_open_error() {
    let workspace = Workspace::new();
    let path = workspace.path("request.json");

    let err = load_route_request(&path).expect_err("missing request should error");
    match err {
        CliError::OpenRouteRequest { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected OpenRouteRequest, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_maps_configuration_errors() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let mut composer = MergeComposer::new();
    composer.push_cli(json!({ "request_path": 42 }));

    let err = config_from_layers_for_test(composer.layers())
        .expect_err("invalid config layer should map to CliError::Configuration");
    match err {
        CliError::Configuration(_) => {}
        other => panic!("expected CliError::Configuration, found {other:?}"),
    }
}

#[rstest]
fn merge_layers_honours_precedence() {
    use ortho_config::MergeComposer;
    use serde_json::json;

    let workspace = Workspace::new();
    let env_request = workspace.path("from-env-request.json");
    let cli_pbf = workspace.path("from-cli.osm.pbf");
    let file_db = workspace.path("from-file.db");

    let mut composer = MergeComposer::new();
    composer.push_file(
        json!({
            "osm_pbf": workspace.path("from-file.osm.pbf").as_str(),
            "obstacles_db": file_db.as_str(),
            "bbox_margin_deg": 0.02,
        }),
        None,
    );
    composer.push_environment(json!({
        "request_path": env_request.as_str(),
        "osm_pbf": workspace.path("from-env.osm.pbf").as_str(),
    }));
    composer.push_cli(json!({
        "osm_pbf": cli_pbf.as_str(),
        "network": "all",
    }));

    let config =
        config_from_layers_for_test(composer.layers()).expect("merged config should build");
    assert_eq!(config.request_path, env_request);
    assert_eq!(config.osm_pbf, cli_pbf);
    assert_eq!(config.obstacles_db, file_db);
    assert_eq!(config.router.bbox_margin_deg, 0.02);
    assert_eq!(config.router.network_type, NetworkType::All);
}

#[rstest]
fn route_args_read_paths_from_config_json() {
    use serde_json::json;

    let args: RouteArgs = serde_json::from_value(json!({
        "request_path": "requests/walk.json",
        "osm_pbf": "maps/area.osm.pbf",
        "network": "walk",
    }))
    .expect("path fields should deserialize");
    assert_eq!(args.request_path.as_deref(), Some(Utf8Path::new("requests/walk.json")));
    assert_eq!(args.osm_pbf.as_deref(), Some(Utf8Path::new("maps/area.osm.pbf")));
    assert_eq!(args.obstacles_db, None);

    let value = serde_json::to_value(&args).expect("args should serialize");
    assert_eq!(value["osm_pbf"], json!("maps/area.osm.pbf"));
}
