use anyhow::Result;
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use traffic_core::simulation::{
    demo, SimConfig, TrafficSimulation, Vec2, DEFAULT_SEARCH_RADIUS, DEFAULT_WORLD_HEIGHT,
    DEFAULT_WORLD_WIDTH,
};

#[derive(Parser)]
#[command(name = "traffic_core")]
#[command(about = "Headless traffic simulation over a generated road grid")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "1000")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// Number of vehicles to spawn on the grid
    #[arg(long, default_value = "20")]
    vehicles: usize,

    /// Seed for vehicle placement and destinations
    #[arg(long, default_value = "42")]
    seed: u64,

    /// World width
    #[arg(long, default_value_t = DEFAULT_WORLD_WIDTH)]
    width: f32,

    /// World height
    #[arg(long, default_value_t = DEFAULT_WORLD_HEIGHT)]
    height: f32,

    /// Clamp vehicles to the world rectangle
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    keep_in_bounds: bool,

    /// Junctions per side of the generated road grid
    #[arg(long, default_value = "4")]
    grid: usize,

    /// Distance between neighbouring junctions
    #[arg(long, default_value = "120.0")]
    spacing: f32,

    /// Radius used to snap route endpoints onto roads
    #[arg(long, default_value_t = DEFAULT_SEARCH_RADIUS)]
    search_radius: f32,

    /// Skip the ASCII map in reports
    #[arg(long)]
    no_map: bool,

    /// Wall-clock pause between one-second reports, in milliseconds
    #[arg(long, default_value = "0")]
    pace_ms: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) -> Result<()> {
    info!("Running traffic simulation in headless mode...");
    info!("Ticks: {}, Delta: {}s", cli.ticks, cli.delta);

    let config = SimConfig {
        search_radius: cli.search_radius,
        ..SimConfig::default()
    };
    let mut sim = TrafficSimulation::with_config(config);
    sim.initialize(cli.width, cli.height);
    sim.set_keep_in_bounds(cli.keep_in_bounds);

    // Centre the grid in the world
    let extent = cli.grid.saturating_sub(1) as f32 * cli.spacing;
    let origin = Vec2::new(cli.width - extent, cli.height - extent) * 0.5;
    let network = demo::build_grid_network(cli.grid, cli.grid, cli.spacing, origin);
    sim.set_road_network(network.into_shared());

    let mut rng = StdRng::seed_from_u64(cli.seed);
    demo::populate(&mut sim, cli.vehicles, &mut rng)?;

    info!("Initial state:");
    report(&sim, cli);

    // Calculate how many ticks equal 1 second of simulation time
    let ticks_per_second = ((1.0 / cli.delta).ceil() as u32).max(1);

    let mut tick = 0;
    while tick < cli.ticks {
        let ticks_to_run = ticks_per_second.min(cli.ticks - tick);
        for _ in 0..ticks_to_run {
            tick += 1;
            sim.update(cli.delta);
        }

        info!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            tick as f32 * cli.delta
        );
        report(&sim, cli);

        if tick < cli.ticks && cli.pace_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(cli.pace_ms));
        }
    }

    info!("=== Final State ===");
    report(&sim, cli);
    info!("SIMULATION COMPLETE");
    Ok(())
}

fn report(sim: &TrafficSimulation, cli: &Cli) {
    sim.print_summary();
    if !cli.no_map {
        sim.draw_map();
    }
}
