use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tileworld_common::{CHUNK_HEIGHT, CHUNK_WIDTH, ChunkPosition, GlobalTilePosition};
use tileworld_kernel::{Solidity, Tile, World};
use tileworld_pathfind::{
    FollowConfig, Path, PathFinder, PathFollower, PathOutcome, PathService,
};
use tileworld_stream::{FlatChunkSource, StreamConfig, StreamState};

#[derive(Parser)]
#[command(name = "tileworld-cli", about = "CLI tool for tileworld operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and chunk geometry
    Info,
    /// Find a path and print it
    Path {
        #[command(flatten)]
        route: RouteArgs,
        /// Print waypoints as JSON instead of a map
        #[arg(long)]
        json: bool,
    },
    /// Find a path on the background worker and walk it at a fixed tick rate
    Walk {
        #[command(flatten)]
        route: RouteArgs,
        /// Waypoints consumed per second (0.1 to 1000)
        #[arg(long, default_value = "10", value_parser = parse_tick_rate)]
        hz: f32,
        /// Simulated frames per second driving the follower (1 to 1000)
        #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=MAX_FPS))]
        fps: u32,
    },
}

#[derive(Args)]
struct RouteArgs {
    /// Start tile as `x,y` in global tile coordinates
    #[arg(long, allow_hyphen_values = true)]
    from: GlobalTilePosition,
    /// Goal tile as `x,y` in global tile coordinates
    #[arg(long, allow_hyphen_values = true)]
    to: GlobalTilePosition,
    #[command(flatten)]
    terrain: TerrainArgs,
}

#[derive(Args)]
struct TerrainArgs {
    /// Chunks loaded around the origin chunk (0 to 32)
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(u32).range(0..=MAX_RADIUS))]
    radius: u32,
    /// Make an entire row solid across the loaded chunks
    #[arg(long = "wall", allow_hyphen_values = true)]
    walls: Vec<i32>,
    /// Reopen a tile after walls are placed
    #[arg(long = "gap", allow_hyphen_values = true)]
    gaps: Vec<GlobalTilePosition>,
    /// Make a single tile solid
    #[arg(long = "solid", allow_hyphen_values = true)]
    solids: Vec<GlobalTilePosition>,
}

const MAX_FPS: i64 = 1000;
const MAX_RADIUS: i64 = 32;
const TICK_RATE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=1000.0;

fn parse_tick_rate(value: &str) -> Result<f32, String> {
    let hz: f32 = value.parse().map_err(|e| format!("`{value}` is not a number: {e}"))?;
    if TICK_RATE_RANGE.contains(&hz) {
        Ok(hz)
    } else {
        Err(format!(
            "{hz} is not in {}..={}",
            TICK_RATE_RANGE.start(),
            TICK_RATE_RANGE.end()
        ))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tileworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("chunk: {CHUNK_WIDTH}x{CHUNK_HEIGHT} tiles");
            let world = World::new();
            let origin = world.world_position_of(world.tile_at(GlobalTilePosition::new(0, 0))?)?;
            println!("tile (0, 0) center: {origin}");
            println!(
                "follow cadence: {:?}/waypoint",
                FollowConfig::default().tick_interval()
            );
        }
        Commands::Path { route, json } => {
            let world = build_world(&route.terrain)?;
            let (start, goal) = endpoints(&world, &route)?;
            let outcome = PathFinder::new(&world).find_path(&start, &goal);
            if json {
                let value = serde_json::json!({
                    "reachable": outcome.is_found(),
                    "waypoints": outcome.path(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                match &outcome {
                    PathOutcome::Found(path) => {
                        println!(
                            "{} waypoints, length {:.3}",
                            path.len(),
                            path.total_length()
                        );
                        print!("{}", render_map(&world, Some(path), &start, &goal));
                    }
                    PathOutcome::Unreachable => {
                        println!("goal {} is unreachable from {}", route.to, route.from);
                        print!("{}", render_map(&world, None, &start, &goal));
                    }
                }
            }
        }
        Commands::Walk { route, hz, fps } => {
            let world = Arc::new(build_world(&route.terrain)?);
            let (start, goal) = endpoints(&world, &route)?;

            let mut service = PathService::spawn(Arc::clone(&world))?;
            service.request(start, goal)?;
            let response = service
                .wait(Duration::from_secs(10))?
                .context("path worker did not answer in time")?;

            let Some(path) = response.outcome.into_path() else {
                println!("goal {} is unreachable; standing still", route.to);
                return Ok(());
            };

            let mut follower = PathFollower::new(&FollowConfig { tick_rate_hz: hz });
            follower.set_path(path);
            let frame = Duration::from_secs(1) / fps;
            let mut clock = Duration::ZERO;
            while !follower.is_idle() {
                clock += frame;
                if let Some(waypoint) = follower.update(frame) {
                    println!(
                        "t={:>6.2}s  tile {}  at {}",
                        clock.as_secs_f32(),
                        waypoint.tile.global(),
                        waypoint.world_position
                    );
                }
            }
            println!("arrived at {}", route.to);
        }
    }

    Ok(())
}

/// Stream chunks around the origin, then apply terrain edits in order:
/// walls, gaps, single solids.
fn build_world(terrain: &TerrainArgs) -> anyhow::Result<World> {
    let mut world = World::empty();
    let mut stream = StreamState::new(StreamConfig {
        load_radius: terrain.radius,
        load_budget: usize::MAX,
        unload_budget: usize::MAX,
    });
    stream.update(&mut world, ChunkPosition::ORIGIN, &FlatChunkSource);
    tracing::debug!(chunks = world.chunk_count(), "world streamed");

    let (min_x, max_x) = loaded_span(&world, |c| c.x, CHUNK_WIDTH);
    for &y in &terrain.walls {
        for x in min_x..=max_x {
            let p = GlobalTilePosition::new(x, y);
            world
                .set_solidity(p, Solidity::Solid)
                .with_context(|| format!("wall row {y} leaves the loaded chunks"))?;
        }
    }
    for &p in &terrain.gaps {
        world
            .set_solidity(p, Solidity::NonSolid)
            .with_context(|| format!("gap {p} is outside the loaded chunks"))?;
    }
    for &p in &terrain.solids {
        world
            .set_solidity(p, Solidity::Solid)
            .with_context(|| format!("solid {p} is outside the loaded chunks"))?;
    }
    Ok(world)
}

fn endpoints(world: &World, route: &RouteArgs) -> anyhow::Result<(Tile, Tile)> {
    let start = *world
        .tile_at(route.from)
        .with_context(|| format!("start {} is not in the world", route.from))?;
    let goal = *world
        .tile_at(route.to)
        .with_context(|| format!("goal {} is not in the world", route.to))?;
    Ok((start, goal))
}

/// Inclusive global tile range covered by loaded chunks along one axis.
fn loaded_span(world: &World, axis: impl Fn(ChunkPosition) -> i32, size: i32) -> (i32, i32) {
    let min = world.chunk_positions().map(&axis).min().unwrap_or(0);
    let max = world.chunk_positions().map(&axis).max().unwrap_or(-1);
    (min * size, (max + 1) * size - 1)
}

fn render_map(world: &World, path: Option<&Path>, start: &Tile, goal: &Tile) -> String {
    let (min_x, max_x) = loaded_span(world, |c| c.x, CHUNK_WIDTH);
    let (min_y, max_y) = loaded_span(world, |c| c.y, CHUNK_HEIGHT);
    let on_path = |p: GlobalTilePosition| {
        path.is_some_and(|path| path.waypoints().iter().any(|w| w.tile.global() == p))
    };

    let mut out = String::new();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = GlobalTilePosition::new(x, y);
            let c = if p == start.global() {
                'S'
            } else if p == goal.global() {
                'G'
            } else if world.is_solid(p).unwrap_or(true) {
                '#'
            } else if on_path(p) {
                '*'
            } else {
                '.'
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}
