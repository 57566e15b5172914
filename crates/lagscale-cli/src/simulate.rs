//! Output setup and the simulation run behind the `lagscale` binary.

use std::fs::{self, File};
use std::io::BufWriter;

use anyhow::{Context, Result};
use lagscale_core::SimulationConfig;
use lagscale_sim::{SimulationWriter, Summary, run, write_params};
use tracing::info;

/// Create the output directory and both files, then run the simulation.
///
/// The config is checked before anything touches the filesystem. Both files
/// are then created, truncated, and the parameters row written before the
/// first tick runs.
pub fn simulate(config: &SimulationConfig) -> Result<Summary> {
    config.validate().context("invalid simulation config")?;

    let output = &config.output;
    if !output.dir.as_os_str().is_empty() {
        fs::create_dir_all(&output.dir)
            .with_context(|| format!("creating output directory {}", output.dir.display()))?;
    }

    let params_path = output.params_path();
    let params = File::create(&params_path)
        .with_context(|| format!("creating {}", params_path.display()))?;
    write_params(BufWriter::new(params), config)?;

    let simulation_path = output.simulation_path();
    let simulation = File::create(&simulation_path)
        .with_context(|| format!("creating {}", simulation_path.display()))?;
    let mut writer = SimulationWriter::new(BufWriter::new(simulation))?;

    info!(
        params = %params_path.display(),
        simulation = %simulation_path.display(),
        "writing results"
    );
    Ok(run(config, &mut writer)?)
}
