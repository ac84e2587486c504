//! Headless particle life runner.
//!
//! Loads a simulation config from JSON and advances it for a number of ticks,
//! logging activity as it goes.
//!
//! Usage: `particle-life [config.json] [ticks]`

use particle_life::{SimConfig, Simulation};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

const DEFAULT_TICKS: u64 = 600;
const REPORT_EVERY: u64 = 60;

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1).map(PathBuf::from) {
        Some(path) => SimConfig::load(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            SimConfig::default()
        }),
        None => {
            info!("no config file specified, using defaults");
            SimConfig::default()
        }
    };
    let ticks = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            warn!(error = %e, "invalid config, using defaults");
            match Simulation::new(SimConfig::default()) {
                Ok(sim) => sim,
                Err(e) => {
                    tracing::error!(error = %e, "default config rejected");
                    std::process::exit(1);
                }
            }
        }
    };

    info!(
        particles = sim.particles().len(),
        species = sim.rules().len(),
        seed = sim.config().seed,
        ticks,
        "starting particle life"
    );

    for tick in 1..=ticks {
        let Some(activity) = sim.step() else {
            warn!("no particles to simulate");
            break;
        };
        if tick % REPORT_EVERY == 0 {
            info!(
                tick,
                activity,
                time_scale = sim.config().time_scale,
                fps = sim.time().fps(),
                "tick"
            );
        }
    }

    info!(generator_state = sim.seed(), "finished");
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
