//! Control loop: alternates controller and driver for a fixed tick count.

use std::io::Write;

use lagscale_core::stats::online_avg;
use lagscale_core::{Discretized, Observation, SimulationConfig};
use tracing::{info, warn};

use crate::driver::SimulationDriver;
use crate::engine::MmsEngine;
use crate::error::SimResult;
use crate::report::SimulationWriter;

/// Totals over a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub ticks: u64,
    /// Mean of the controller's desired capacity across ticks.
    pub mean_servers: f64,
    /// Largest end-of-tick queue length seen.
    pub peak_queue_length: u64,
    pub final_queue_length: u64,
}

/// Run `config.steps` ticks, writing one row per tick to `out`.
pub fn run<W: Write>(
    config: &SimulationConfig,
    out: &mut SimulationWriter<W>,
) -> SimResult<Summary> {
    config.validate()?;
    if config.rho >= 1.0 {
        warn!(rho = config.rho, "target utilization at or above 1.0");
    }

    let lambda = Discretized::new(config.lambda_schedule()?, config.dt);
    let mu = Discretized::new(config.mu_schedule()?, config.dt);
    let engine = MmsEngine::new(config.seed, lambda, mu);
    let mut driver = SimulationDriver::new(engine, config.dt, config.delay);
    let mut controller = config.controller();

    info!(
        seed = config.seed,
        steps = config.steps,
        rho = config.rho,
        dt = config.dt,
        delay = config.delay,
        compensation_terms = controller.terms().len(),
        "simulation starting"
    );

    let mut summary = Summary::default();
    let mut observation = Observation::default();
    for tick in 0..config.steps {
        let servers = controller.calculate_from(&observation);
        observation = driver.run(servers as u32);

        info!(
            tick,
            servers,
            delayed = observation.average_servers,
            lambda = observation.arrivals,
            mu = observation.service_rate,
            response_time = observation.mean_response_time,
            waiting = observation.queue_length,
            "tick"
        );
        out.write_row(servers, &observation, config.dt)?;

        summary.mean_servers = online_avg(servers, tick, summary.mean_servers);
        summary.peak_queue_length = summary.peak_queue_length.max(observation.queue_length);
        summary.final_queue_length = observation.queue_length;
        summary.ticks += 1;
    }
    out.flush()?;

    info!(
        ticks = summary.ticks,
        mean_servers = summary.mean_servers,
        peak_queue_length = summary.peak_queue_length,
        "simulation finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn writes_one_row_per_tick() {
        let config = SimulationConfig {
            steps: 25,
            lambda: "4.0".to_string(),
            mu: "1.0".to_string(),
            ..SimulationConfig::default()
        };
        let mut out = SimulationWriter::new(Vec::new()).unwrap();
        let summary = run(&config, &mut out).unwrap();

        assert_eq!(summary.ticks, 25);
        assert_eq!(out.rows(), 25);
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 26);
    }

    #[test]
    fn first_tick_holds_at_floor() {
        let config = SimulationConfig {
            steps: 1,
            ..SimulationConfig::default()
        };
        let mut out = SimulationWriter::new(Vec::new()).unwrap();
        run(&config, &mut out).unwrap();

        let text = String::from_utf8(out.into_inner()).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with("1.000000,"), "row {row}");
    }

    #[test]
    fn zero_steps_writes_header_only() {
        let config = SimulationConfig {
            steps: 0,
            ..SimulationConfig::default()
        };
        let mut out = SimulationWriter::new(Vec::new()).unwrap();
        let summary = run(&config, &mut out).unwrap();
        assert_eq!(summary, Summary::default());
        assert_eq!(out.rows(), 0);
    }

    #[test]
    fn invalid_schedule_aborts_before_any_tick() {
        let config = SimulationConfig {
            lambda: "1.0,abc".to_string(),
            steps: 10,
            ..SimulationConfig::default()
        };
        let mut out = SimulationWriter::new(Vec::new()).unwrap();
        let err = run(&config, &mut out).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
        assert_eq!(out.rows(), 0);
    }

    #[test]
    fn saturated_rho_still_runs() {
        let config = SimulationConfig {
            steps: 5,
            rho: 1.0,
            ..SimulationConfig::default()
        };
        let mut out = SimulationWriter::new(Vec::new()).unwrap();
        let summary = run(&config, &mut out).unwrap();
        assert_eq!(summary.ticks, 5);
    }

    #[test]
    fn oversized_delay_aborts_before_any_tick() {
        let config = SimulationConfig {
            steps: 10,
            dt: 0.001,
            delay: 1e13,
            ..SimulationConfig::default()
        };
        let mut out = SimulationWriter::new(Vec::new()).unwrap();
        let err = run(&config, &mut out).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
        assert_eq!(out.rows(), 0);
    }

    #[test]
    fn controller_scales_up_under_load() {
        let config = SimulationConfig {
            seed: 9,
            steps: 60,
            rho: 0.7,
            dt: 0.1,
            lambda: "20.0".to_string(),
            mu: "1.0".to_string(),
            ..SimulationConfig::default()
        };
        let mut out = SimulationWriter::new(Vec::new()).unwrap();
        let summary = run(&config, &mut out).unwrap();
        // 20 arrivals per tick at rate 1 per server needs well over 1 server.
        assert!(summary.mean_servers > 10.0, "{summary:?}");
    }
}
