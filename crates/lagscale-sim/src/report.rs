//! CSV output for parameters and per-tick trajectories.
//!
//! Reals are written with six decimals. NaN measurements from degenerate
//! ticks are written as `NaN`.

use std::io::Write;

use lagscale_core::{Observation, SimulationConfig};

use crate::error::{SimError, SimResult};

pub const PARAMS_HEADER: &str = "seed,step,rho,DT,delay";
pub const SIMULATION_HEADER: &str =
    "servers,delayedServers,waiting,averageResponseTime,lambda,mu";

/// Write the parameters header and its single data row.
pub fn write_params<W: Write>(mut w: W, config: &SimulationConfig) -> SimResult<()> {
    params_rows(&mut w, config).map_err(|source| SimError::Write {
        what: "parameters",
        source,
    })
}

fn params_rows<W: Write>(w: &mut W, config: &SimulationConfig) -> std::io::Result<()> {
    writeln!(w, "{PARAMS_HEADER}")?;
    writeln!(
        w,
        "{},{},{:.6},{:.6},{:.6}",
        config.seed, config.steps, config.rho, config.dt, config.delay
    )?;
    w.flush()
}

/// Streams one CSV row per tick.
pub struct SimulationWriter<W: Write> {
    inner: W,
    rows: u64,
}

impl<W: Write> SimulationWriter<W> {
    /// Wrap `inner` and write the header.
    pub fn new(mut inner: W) -> SimResult<Self> {
        writeln!(inner, "{SIMULATION_HEADER}").map_err(write_err)?;
        Ok(Self { inner, rows: 0 })
    }

    /// Record the decision for a tick and what the system did with it.
    ///
    /// `mean_response_time` is divided by `dt` so the column is in substeps.
    pub fn write_row(&mut self, servers: f64, observation: &Observation, dt: f64) -> SimResult<()> {
        writeln!(
            self.inner,
            "{:.6},{:.6},{},{:.6},{:.6},{:.6}",
            servers,
            observation.average_servers,
            observation.queue_length,
            observation.mean_response_time / dt,
            observation.arrivals,
            observation.service_rate,
        )
        .map_err(write_err)?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> SimResult<()> {
        self.inner.flush().map_err(write_err)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

fn write_err(source: std::io::Error) -> SimError {
    SimError::Write {
        what: "simulation",
        source,
    }
}
