use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use tabletop::camera::{Camera, Point, Viewport};
use tabletop::config::{ConfigError, TabletopConfig};
use tabletop::consts::{DEFAULT_PANEL_MIN_HEIGHT, DEFAULT_PANEL_MIN_WIDTH};
use tabletop::grid::GridSpec;
use tabletop::scenario::{Scenario, ScenarioError};
use tabletop::shape::{AreaShape, Segment, ShapeKind};
use tabletop::token::{self, Token};
use tabletop::window::{ResizeHandle, WindowFrame};

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("scenario error: {0}")]
    Scenario(#[from] ScenarioError),
    #[error("grid size must be greater than zero, got {0}")]
    InvalidGridSize(f64),
    #[error("feet per square must be greater than zero")]
    InvalidFeetPerSquare,
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "tabletop-cli", about = "Battle map measurement and area-of-effect queries")]
struct Cli {
    /// Scenario JSON supplying grid, camera, and tokens.
    #[arg(long, env = "TABLETOP_SCENARIO")]
    scenario: Option<PathBuf>,

    /// Override the grid cell size in world pixels.
    #[arg(long)]
    grid_size_px: Option<f64>,

    /// Override the feet represented by one grid square.
    #[arg(long)]
    feet_per_square: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ruler distance between two world points.
    Measure(SegmentArgs),
    /// Tokens covered by a 53° cone from `--from` toward `--to`.
    Cone(SegmentArgs),
    /// Tokens covered by a circle centered at `--from` through `--to`.
    Circle(SegmentArgs),
    /// Snap a world point to the nearest grid intersection.
    Snap {
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        at: Point,
    },
    /// Convert between screen and world space with the scenario camera.
    Project(ProjectArgs),
    /// Topmost token under a world point.
    TokenAt {
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        at: Point,
    },
    /// Apply a resize handle drag to a panel frame.
    Resize(ResizeArgs),
    /// Load and validate the scenario, then print a summary.
    Validate,
}

#[derive(Args, Debug)]
struct SegmentArgs {
    /// Start point as `x,y` in world units.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    from: Point,
    /// End point as `x,y` in world units.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    to: Point,
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// Point as `x,y`.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    at: Point,
    /// Viewport size as `width,height` in CSS pixels.
    #[arg(long, value_parser = parse_viewport, default_value = "800,600")]
    viewport: Viewport,
    /// Treat `--at` as a screen point and print world coordinates.
    #[arg(long, default_value_t = false)]
    to_world: bool,
}

#[derive(Args, Debug)]
struct ResizeArgs {
    /// Frame as `x,y,width,height`.
    #[arg(long, value_parser = parse_frame)]
    frame: WindowFrame,
    #[arg(long, value_enum)]
    handle: HandleArg,
    /// Pointer delta as `dx,dy`.
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    delta: Point,
    /// Viewport size as `width,height` in CSS pixels.
    #[arg(long, value_parser = parse_viewport, default_value = "1280,800")]
    viewport: Viewport,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum HandleArg {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl From<HandleArg> for ResizeHandle {
    fn from(value: HandleArg) -> Self {
        match value {
            HandleArg::N => Self::N,
            HandleArg::Ne => Self::Ne,
            HandleArg::E => Self::E,
            HandleArg::Se => Self::Se,
            HandleArg::S => Self::S,
            HandleArg::Sw => Self::Sw,
            HandleArg::W => Self::W,
            HandleArg::Nw => Self::Nw,
        }
    }
}

fn main() -> Result<(), CliError> {
    // stdout carries the JSON result only.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    let config = TabletopConfig::from_env()?;
    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };
    let grid = resolve_grid(&config, &scenario, cli.grid_size_px, cli.feet_per_square)?;
    tracing::debug!(size_px = grid.size_px, feet_per_square = grid.feet_per_square, "grid resolved");

    let output = match cli.command {
        Command::Measure(args) => run_shape(ShapeKind::Ruler, &args, &grid, &scenario.tokens),
        Command::Cone(args) => run_shape(ShapeKind::Cone, &args, &grid, &scenario.tokens),
        Command::Circle(args) => run_shape(ShapeKind::Circle, &args, &grid, &scenario.tokens),
        Command::Snap { at } => serde_json::to_value(grid.snap(at))?,
        Command::Project(args) => run_project(scenario.camera, &args)?,
        Command::TokenAt { at } => run_token_at(&scenario.tokens, at),
        Command::Resize(args) => run_resize(&args)?,
        Command::Validate => json!({
            "grid": grid,
            "camera": scenario.camera,
            "tokens": scenario.tokens.len(),
            "fog_reveals": scenario.fog.reveals.len(),
        }),
    };
    print_json(&output)
}

/// Grid precedence: defaults, then environment, then scenario file, then flags.
fn resolve_grid(
    config: &TabletopConfig,
    scenario: &Scenario,
    size_px: Option<f64>,
    feet_per_square: Option<u32>,
) -> Result<GridSpec, CliError> {
    effective_grid(scenario.grid_or(config.grid), size_px, feet_per_square)
}

/// Apply flag overrides on top of a base grid.
fn effective_grid(base: GridSpec, size_px: Option<f64>, feet_per_square: Option<u32>) -> Result<GridSpec, CliError> {
    let mut grid = base;
    if let Some(size_px) = size_px {
        if size_px.is_nan() || size_px <= 0.0 {
            return Err(CliError::InvalidGridSize(size_px));
        }
        grid.size_px = size_px;
    }
    if let Some(feet) = feet_per_square {
        if feet == 0 {
            return Err(CliError::InvalidFeetPerSquare);
        }
        grid.feet_per_square = feet;
    }
    Ok(grid)
}

fn run_shape(kind: ShapeKind, args: &SegmentArgs, grid: &GridSpec, tokens: &[Token]) -> Value {
    let shape = AreaShape::from_segment(kind, Segment::new(args.from, args.to));
    let distance = shape.measure(grid);
    let affected: Vec<&str> = shape.affected_tokens(tokens).into_iter().map(|t| t.id.as_str()).collect();
    let mut out = json!({
        "kind": kind,
        "squares": distance.squares,
        "feet": distance.feet,
        "label": shape.label(grid),
        "label_at": shape.label_anchor(),
        "affected": affected,
    });
    if let AreaShape::Cone(cone) = shape {
        out["outline"] = json!(cone.outline());
    }
    out
}

fn run_project(camera: Camera, args: &ProjectArgs) -> Result<Value, CliError> {
    let point = if args.to_world {
        camera.screen_to_world(args.viewport, args.at)
    } else {
        camera.world_to_screen(args.viewport, args.at)
    };
    Ok(serde_json::to_value(point)?)
}

fn run_token_at(tokens: &[Token], at: Point) -> Value {
    match token::token_at(tokens, at) {
        Some(token) => json!({ "id": token.id, "center": token.center() }),
        None => Value::Null,
    }
}

fn run_resize(args: &ResizeArgs) -> Result<Value, CliError> {
    let frame = args.frame.apply_resize(args.handle.into(), args.delta, args.viewport);
    Ok(serde_json::to_value(frame)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

// --- Argument parsing ---

fn parse_numbers<const N: usize>(raw: &str) -> Result<[f64; N], String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers, got `{raw}`"));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.parse::<f64>().map_err(|e| format!("invalid number `{part}`: {e}"))?;
    }
    Ok(out)
}

fn parse_point(raw: &str) -> Result<Point, String> {
    let [x, y] = parse_numbers::<2>(raw)?;
    Ok(Point::new(x, y))
}

fn parse_viewport(raw: &str) -> Result<Viewport, String> {
    let [width, height] = parse_numbers::<2>(raw)?;
    if width <= 0.0 || height <= 0.0 {
        return Err(format!("viewport must be positive, got `{raw}`"));
    }
    Ok(Viewport::new(width, height))
}

fn parse_frame(raw: &str) -> Result<WindowFrame, String> {
    let [x, y, width, height] = parse_numbers::<4>(raw)?;
    Ok(WindowFrame {
        x,
        y,
        width,
        height,
        min_width: DEFAULT_PANEL_MIN_WIDTH,
        min_height: DEFAULT_PANEL_MIN_HEIGHT,
    })
}
