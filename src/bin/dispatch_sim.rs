//! Simulation driver: generates random requests, runs the engine to
//! completion, and prints the report.
//!
//! ```text
//! dispatch_sim [REQUESTS] [CONFIG]
//! ```
//!
//! Without a config file, two services with three workers each are used.
//! `RUST_LOG` controls logging; `PROMETHEUS_DISPATCH_SERVICE_TIME_MS`
//! overrides the service time.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use rand::Rng;

use prometheus_dispatch::config::{EngineConfig, WorkerConfig};
use prometheus_dispatch::core::{AppResult, Engine};
use prometheus_dispatch::report::render;
use prometheus_dispatch::util::telemetry::init_tracing;

const MIN_DEMAND: u32 = 2;
/// Demands may exceed the largest capacity by this much, so some requests drop.
const DEMAND_HEADROOM: u32 = 5;

#[derive(Parser, Debug)]
#[command(
    name = "dispatch_sim",
    version,
    about = "Run a randomized workload through the dispatch engine and print the report"
)]
struct Args {
    /// Number of random requests to submit.
    #[arg(default_value_t = 20)]
    requests: usize,

    /// JSON engine configuration. Defaults to 2 services x 3 workers.
    config: Option<PathBuf>,
}

fn default_config() -> EngineConfig {
    EngineConfig::uniform(
        2,
        &[
            WorkerConfig::new(1, 10),
            WorkerConfig::new(2, 6),
            WorkerConfig::new(3, 15),
        ],
    )
}

fn load_config(path: Option<&Path>) -> AppResult<EngineConfig> {
    let config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            EngineConfig::from_json_str(&raw).map_err(anyhow::Error::msg)?
        }
        None => default_config(),
    };
    config.with_env_overrides().map_err(anyhow::Error::msg)
}

fn main() -> AppResult<()> {
    init_tracing();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let max_demand = config.max_capacity() + DEMAND_HEADROOM;
    let engine = Engine::new(&config)?;

    let mut rng = rand::rng();
    for _ in 0..args.requests {
        let service = rng.random_range(0..engine.service_count());
        let demand = rng.random_range(MIN_DEMAND..=max_demand);
        engine.submit_request(service, demand, Instant::now())?;
    }

    let metrics = engine.finish()?;
    println!("{}", render(&metrics));
    Ok(())
}
