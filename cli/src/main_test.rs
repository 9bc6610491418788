#![allow(clippy::float_cmp)]

use super::*;
use tabletop::token::TokenShape;

#[test]
fn parse_point_accepts_negative_and_spaced() {
    assert_eq!(parse_point("-5, 12.5").unwrap(), Point::new(-5.0, 12.5));
}

#[test]
fn parse_point_rejects_wrong_arity() {
    assert!(parse_point("1").is_err());
    assert!(parse_point("1,2,3").is_err());
    assert!(parse_point("a,2").is_err());
}

#[test]
fn parse_viewport_rejects_non_positive() {
    assert!(parse_viewport("0,600").is_err());
    assert_eq!(parse_viewport("800,600").unwrap(), Viewport::new(800.0, 600.0));
}

#[test]
fn parse_frame_uses_default_minimums() {
    let frame = parse_frame("10,20,400,300").unwrap();
    assert_eq!(frame.width, 400.0);
    assert_eq!(frame.min_width, DEFAULT_PANEL_MIN_WIDTH);
    assert_eq!(frame.min_height, DEFAULT_PANEL_MIN_HEIGHT);
}

#[test]
fn effective_grid_applies_overrides() {
    let grid = effective_grid(GridSpec::default(), Some(70.0), Some(10)).unwrap();
    assert_eq!(grid.size_px, 70.0);
    assert_eq!(grid.feet_per_square, 10);
    assert_eq!(effective_grid(GridSpec::default(), None, None).unwrap(), GridSpec::default());
}

#[test]
fn effective_grid_rejects_invalid_overrides() {
    assert!(matches!(effective_grid(GridSpec::default(), Some(0.0), None), Err(CliError::InvalidGridSize(_))));
    assert!(matches!(effective_grid(GridSpec::default(), None, Some(0)), Err(CliError::InvalidFeetPerSquare)));
}

fn env_config(size_px: &str) -> TabletopConfig {
    let size_px = size_px.to_owned();
    TabletopConfig::from_lookup(move |key| (key == "TABLETOP_GRID_SIZE_PX").then(|| size_px.clone())).unwrap()
}

#[test]
fn env_grid_applies_to_grid_less_scenario() {
    let config = env_config("30");
    let scenario = Scenario::from_json(r#"{ "tokens": [] }"#).unwrap();
    let grid = resolve_grid(&config, &scenario, None, None).unwrap();
    assert_eq!(grid.size_px, 30.0);
    let args = SegmentArgs { from: Point::new(0.0, 0.0), to: Point::new(150.0, 0.0) };
    assert_eq!(run_shape(ShapeKind::Ruler, &args, &grid, &[])["squares"], 5);
}

#[test]
fn scenario_grid_beats_env_and_flags_beat_both() {
    let config = env_config("30");
    let scenario = Scenario::from_json(r#"{ "grid": { "size_px": 40 }, "tokens": [] }"#).unwrap();
    assert_eq!(resolve_grid(&config, &scenario, None, None).unwrap().size_px, 40.0);
    assert_eq!(resolve_grid(&config, &scenario, Some(60.0), None).unwrap().size_px, 60.0);
}

#[test]
fn cone_output_lists_affected_and_outline() {
    let tokens = vec![
        Token::new("in", 50.0, 0.0, 10.0, TokenShape::Circle),
        Token::new("out", 50.0, 60.0, 10.0, TokenShape::Circle),
    ];
    let args = SegmentArgs { from: Point::new(0.0, 0.0), to: Point::new(100.0, 0.0) };
    let out = run_shape(ShapeKind::Cone, &args, &GridSpec::default(), &tokens);
    assert_eq!(out["kind"], "cone");
    assert_eq!(out["feet"], 10);
    assert_eq!(out["label"], "10 ft");
    assert_eq!(out["affected"], json!(["in"]));
    assert_eq!(out["outline"].as_array().map(Vec::len), Some(3));
}

#[test]
fn measure_output_has_no_outline() {
    let args = SegmentArgs { from: Point::new(0.0, 0.0), to: Point::new(150.0, 0.0) };
    let out = run_shape(ShapeKind::Ruler, &args, &GridSpec::default(), &[]);
    assert_eq!(out["squares"], 3);
    assert_eq!(out["feet"], 15);
    assert!(out.get("outline").is_none());
}

#[test]
fn project_round_trips_through_camera() {
    let camera = Camera::new(100.0, 50.0, 2.0);
    let viewport = Viewport::new(800.0, 600.0);
    let to_screen = ProjectArgs { at: Point::new(100.0, 50.0), viewport, to_world: false };
    assert_eq!(run_project(camera, &to_screen).unwrap(), json!({ "x": 400.0, "y": 300.0 }));
    let to_world = ProjectArgs { at: Point::new(400.0, 300.0), viewport, to_world: true };
    assert_eq!(run_project(camera, &to_world).unwrap(), json!({ "x": 100.0, "y": 50.0 }));
}

#[test]
fn token_at_reports_null_when_empty() {
    assert_eq!(run_token_at(&[], Point::new(0.0, 0.0)), Value::Null);
}
