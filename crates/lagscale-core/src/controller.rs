//! Delay-compensated capacity controller.
//!
//! Estimates demand from the last observed arrival count, then adds the
//! backlog expected to accrue because recent decisions are not yet
//! reflected in the observed system. Each `Compensation` term replays the
//! last `ceil(horizon)` decisions; any that would have been too small for
//! current demand contribute their shortfall.

use tracing::debug;

use crate::actuator::ActuatorPolicy;
use crate::delay::DelayBuffer;
use crate::stats::online_avg;
use crate::types::Observation;

/// One delay horizon the controller compensates for.
#[derive(Debug, Clone)]
pub struct Compensation {
    horizon: f64,
    buffer: DelayBuffer,
    /// Same length as the buffer. Only index 0 may be fractional.
    weights: Vec<f64>,
}

impl Compensation {
    /// Build a term for a horizon of `horizon` ticks.
    ///
    /// The buffer holds `ceil(horizon)` past decisions. For a non-integer
    /// horizon the oldest slot is weighted by the fractional part.
    pub fn new(horizon: f64) -> Self {
        let gamma = horizon.ceil().max(0.0) as usize;
        let mut weights = vec![1.0; gamma];
        let floor = horizon.floor();
        if gamma > 0 && gamma as f64 != floor {
            weights[0] = horizon - floor;
        }
        Self {
            horizon,
            buffer: DelayBuffer::new(gamma),
            weights,
        }
    }

    /// Shortfall of the remembered decisions against `lambda`, weighted.
    ///
    /// Contributes nothing until the buffer is warm.
    pub fn predict(&self, lambda: f64, mu: f64) -> f64 {
        let Some(servers) = self.buffer.snapshot() else {
            return 0.0;
        };
        servers
            .iter()
            .zip(&self.weights)
            .map(|(s, w)| (lambda - mu * s).max(0.0) * w)
            .sum()
    }

    fn record(&mut self, servers: f64) {
        self.buffer.insert(servers);
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn buffer(&self) -> &DelayBuffer {
        &self.buffer
    }
}

/// Little's-Law-style controller with optional delay compensation.
#[derive(Debug, Clone)]
pub struct CapacityController {
    rho: f64,
    mu: f64,
    lambda: f64,
    samples: u64,
    actuator: ActuatorPolicy,
    terms: Vec<Compensation>,
}

impl CapacityController {
    /// Create a controller targeting utilization `rho`, with no compensation.
    pub fn new(rho: f64) -> Self {
        Self {
            rho,
            mu: 0.0,
            lambda: 0.0,
            samples: 0,
            actuator: ActuatorPolicy::default(),
            terms: Vec::new(),
        }
    }

    /// Add a compensation term for a delay of `horizon` ticks.
    pub fn with_compensation(mut self, horizon: f64) -> Self {
        self.terms.push(Compensation::new(horizon));
        self
    }

    pub fn with_actuator(mut self, actuator: ActuatorPolicy) -> Self {
        self.actuator = actuator;
        self
    }

    /// Compute the next desired capacity from last tick's measurements.
    ///
    /// Ticks with a NaN or zero service rate or response time carry no
    /// usable information: state is left untouched and the actuator floor
    /// is returned.
    pub fn calculate(&mut self, lambda: f64, mu: f64, mean_response_time: f64) -> f64 {
        if mu.is_nan() || mean_response_time.is_nan() || mu == 0.0 || mean_response_time == 0.0 {
            debug!(mu, mean_response_time, "degenerate measurement, holding at floor");
            return self.actuator.apply(0.0);
        }

        self.lambda = lambda;
        self.mu = online_avg(mu.max(1.0 / mean_response_time), self.samples, self.mu);
        self.samples += 1;

        let mut demand = self.lambda;
        for term in &self.terms {
            demand += term.predict(self.lambda, self.mu);
        }

        let desired = demand / (self.rho * self.mu);
        let servers = self.actuator.apply(desired);
        for term in &mut self.terms {
            term.record(servers);
        }

        debug!(
            lambda = self.lambda,
            mu = self.mu,
            demand,
            desired,
            servers,
            "capacity calculated"
        );
        servers
    }

    /// `calculate` fed from a driver observation.
    pub fn calculate_from(&mut self, observation: &Observation) -> f64 {
        self.calculate(
            observation.arrivals,
            observation.service_rate,
            observation.mean_response_time,
        )
    }

    pub fn rho(&self) -> f64 {
        self.rho
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn terms(&self) -> &[Compensation] {
        &self.terms
    }
}
