//! Tick driver — steps the queue engine through one control tick.
//!
//! A tick of unit length is split into `trunc(1 / dt)` substeps. Every
//! substep pushes the desired server count through the actuation delay
//! line first, so the engine only sees a decision after the configured
//! provisioning lag.

use lagscale_core::stats::{mean, online_avg};
use lagscale_core::{DelayBuffer, Observation};
use tracing::debug;

use crate::engine::QueueEngine;

pub struct SimulationDriver<E> {
    engine: E,
    /// Provisioning lag, in substeps.
    actuation: DelayBuffer,
    dt: f64,
    substeps: u64,
}

impl<E: QueueEngine> SimulationDriver<E> {
    /// `actuation_delay` is in the same time unit as `dt`.
    pub fn new(engine: E, dt: f64, actuation_delay: f64) -> Self {
        let gamma = (actuation_delay / dt).floor().max(0.0) as usize;
        let substeps = (1.0 / dt) as u64;
        debug!(dt, substeps, actuation_gamma = gamma, "driver initialized");
        Self {
            engine,
            actuation: DelayBuffer::new(gamma),
            dt,
            substeps,
        }
    }

    /// Run one tick with `desired` servers requested.
    pub fn run(&mut self, desired: u32) -> Observation {
        let mut arrivals = 0u64;
        let mut completions = 0u64;
        let mut queue_length = 0u64;
        let mut average_servers = 0.0;
        let mut response_times = Vec::new();

        for i in 0..self.substeps {
            let realized = self.actuation.insert(f64::from(desired)) as u32;
            let progress = self.engine.progress(realized);

            arrivals += progress.arrivals;
            completions += progress.response_times.len() as u64;
            queue_length = progress.queue_length;
            average_servers = online_avg(f64::from(realized), i, average_servers);
            response_times.extend(progress.response_times);
        }

        Observation {
            arrivals: arrivals as f64,
            service_rate: completions as f64 / average_servers,
            mean_response_time: mean(&response_times) * self.dt,
            queue_length,
            average_servers,
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn substeps(&self) -> u64 {
        self.substeps
    }

    pub fn actuation_gamma(&self) -> usize {
        self.actuation.capacity()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Progress;

    /// Records the server counts it is given and replays fixed outcomes.
    #[derive(Default)]
    struct ScriptedEngine {
        seen: Vec<u32>,
        arrivals: u64,
        response_times: Vec<f64>,
    }

    impl QueueEngine for ScriptedEngine {
        fn progress(&mut self, servers: u32) -> Progress {
            self.seen.push(servers);
            let response_times = if servers > 0 {
                self.response_times.clone()
            } else {
                Vec::new()
            };
            Progress {
                arrivals: self.arrivals,
                opaque: 999,
                queue_length: self.seen.len() as u64,
                response_times,
            }
        }
    }

    #[test]
    fn substep_count_follows_dt() {
        let driver = SimulationDriver::new(ScriptedEngine::default(), 0.25, 0.0);
        assert_eq!(driver.substeps(), 4);

        let driver = SimulationDriver::new(ScriptedEngine::default(), 1.0, 0.0);
        assert_eq!(driver.substeps(), 1);
    }

    #[test]
    fn actuation_gamma_is_in_substeps() {
        let driver = SimulationDriver::new(ScriptedEngine::default(), 0.5, 2.0);
        assert_eq!(driver.actuation_gamma(), 4);

        let driver = SimulationDriver::new(ScriptedEngine::default(), 1.0, 1.9);
        assert_eq!(driver.actuation_gamma(), 1);
    }

    #[test]
    fn aggregates_substeps() {
        let engine = ScriptedEngine {
            arrivals: 3,
            response_times: vec![1.0, 3.0],
            ..Default::default()
        };
        let mut driver = SimulationDriver::new(engine, 0.5, 0.0);
        let obs = driver.run(4);

        assert_eq!(obs.arrivals, 6.0);
        assert_eq!(obs.average_servers, 4.0);
        // 4 completions over 4 servers.
        assert_eq!(obs.service_rate, 1.0);
        // Mean of [1, 3, 1, 3] substeps, scaled by dt.
        assert_eq!(obs.mean_response_time, 1.0);
        assert_eq!(obs.queue_length, 2);
    }

    #[test]
    fn actuation_delay_holds_back_decisions() {
        let engine = ScriptedEngine::default();
        let mut driver = SimulationDriver::new(engine, 0.5, 1.0);

        let first = driver.run(3);
        let second = driver.run(5);
        let third = driver.run(5);

        assert_eq!(driver.engine().seen, vec![0, 0, 3, 3, 5, 5]);
        assert_eq!(first.average_servers, 0.0);
        assert_eq!(second.average_servers, 3.0);
        assert_eq!(third.average_servers, 5.0);
    }

    #[test]
    fn warm_up_tick_is_degenerate() {
        let engine = ScriptedEngine {
            arrivals: 1,
            response_times: vec![2.0],
            ..Default::default()
        };
        let mut driver = SimulationDriver::new(engine, 1.0, 1.0);
        let obs = driver.run(2);

        assert_eq!(obs.average_servers, 0.0);
        assert!(obs.service_rate.is_nan());
        assert!(obs.mean_response_time.is_nan());
        assert_eq!(obs.arrivals, 1.0);
    }

    #[test]
    fn average_servers_mixes_substeps() {
        let mut driver = SimulationDriver::new(ScriptedEngine::default(), 0.25, 0.5);
        driver.run(4);
        let obs = driver.run(8);
        // Substeps see 4, 4, 8, 8.
        assert!((obs.average_servers - 6.0).abs() < 1e-12);
    }
}
