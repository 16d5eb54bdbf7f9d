use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use glam::Vec2;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rigidsync2d::app::{Clock, SimulationApp};
use rigidsync2d::engine::time::FixedStep;
use rigidsync2d::PhysicsConfig;

#[derive(Parser, Debug)]
#[command(name = "rigidsync2d", version, about = "Headless rigid-body scene demo")]
struct Args {
    /// Number of frames to simulate
    #[arg(long, default_value_t = 300)]
    ticks: u32,

    /// Seconds per frame in fixed-step mode
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// JSON physics config; command-line gravity overrides it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, allow_hyphen_values = true)]
    gravity_x: Option<f32>,

    #[arg(long, allow_hyphen_values = true)]
    gravity_y: Option<f32>,

    /// Pace frames by the wall clock instead of stepping by --dt
    #[arg(long)]
    realtime: bool,

    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => PhysicsConfig::from_json_file(path)?,
        None => PhysicsConfig {
            gravity: Vec2::new(0.0, -9.81),
            ..PhysicsConfig::default()
        },
    };
    if let Some(x) = args.gravity_x {
        config.gravity.x = x;
    }
    if let Some(y) = args.gravity_y {
        config.gravity.y = y;
    }
    info!(?config, "starting rigidsync2d v{}", env!("CARGO_PKG_VERSION"));

    let clock = if args.realtime {
        Clock::Realtime {
            frame: Duration::from_secs_f32(args.dt.max(0.0)),
        }
    } else {
        Clock::Fixed(FixedStep(args.dt))
    };

    let mut app = SimulationApp::new(&config)?;
    app.run(args.ticks, clock)?;
    info!(collisions = app.collisions_seen(), "done");
    Ok(())
}
