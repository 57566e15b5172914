use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lagscale_core::SimulationConfig;
use lagscale_core::config::CompensationConfig;
use tracing::info;

mod simulate;

const SIMULATION_FLAGS: [&str; 9] = [
    "seed", "step", "rho", "dt", "lambda", "mu", "delay", "cdelay", "odelay",
];

#[derive(Parser, Debug)]
#[command(
    name = "lagscale",
    about = "Simulate a delay-compensated capacity controller against an M/M/s queue",
    version
)]
struct Cli {
    /// Seed for the queue's random generator
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of control ticks
    #[arg(long, default_value_t = 1)]
    step: u64,

    /// Target utilization of the servers (< 1.0)
    #[arg(long, default_value_t = 0.7)]
    rho: f64,

    /// Substep length as a fraction of one tick
    #[arg(long = "DT", id = "dt", default_value_t = 1.0)]
    dt: f64,

    /// Arrivals per unit time. Accepts a schedule like 1.0,5,2.0,10,3.0
    #[arg(long, default_value = "1.0")]
    lambda: String,

    /// Services per server per unit time. Same schedule format as --lambda
    #[arg(long, default_value = "1.0")]
    mu: String,

    /// Time until a change in server count takes effect
    #[arg(long, default_value_t = 0.0)]
    delay: f64,

    /// Decision-propagation lag the controller compensates for, in ticks
    #[arg(long, default_value_t = 0.0)]
    cdelay: f64,

    /// Observed actuation lag the controller compensates for, in ticks
    #[arg(long, default_value_t = 0.0)]
    odelay: f64,

    /// Load the simulation settings from a TOML file instead of flags
    #[arg(long, conflicts_with_all = SIMULATION_FLAGS)]
    config: Option<PathBuf>,

    /// Output directory [default: out]
    #[arg(long)]
    dir: Option<PathBuf>,

    /// File name for parameters [default: params.csv]
    #[arg(long)]
    params: Option<String>,

    /// File name for the simulation trajectory [default: simulation.csv]
    #[arg(long)]
    simulation: Option<String>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => SimulationConfig {
                seed: self.seed,
                steps: self.step,
                rho: self.rho,
                dt: self.dt,
                lambda: self.lambda,
                mu: self.mu,
                delay: self.delay,
                compensation: CompensationConfig {
                    decision_delay: self.cdelay,
                    actuation_delay: self.odelay,
                },
                ..SimulationConfig::default()
            },
        };

        if let Some(dir) = self.dir {
            config.output.dir = dir;
        }
        if let Some(params) = self.params {
            config.output.params = params;
        }
        if let Some(simulation) = self.simulation {
            config.output.simulation = simulation;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lagscale=info".parse()?),
        )
        .init();

    let config = Cli::parse().into_config()?;
    let summary = simulate::simulate(&config)?;
    info!(
        ticks = summary.ticks,
        mean_servers = summary.mean_servers,
        peak_queue_length = summary.peak_queue_length,
        final_queue_length = summary.final_queue_length,
        dir = %config.output.dir.display(),
        "run complete"
    );
    Ok(())
}
