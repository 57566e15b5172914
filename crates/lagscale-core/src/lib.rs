//! lagscale-core — the delay-compensated capacity controller.
//!
//! Decides how many servers a queueing system should run so that it stays
//! near a target utilization `rho`, compensating for the lag between a
//! decision and its visibility in the observed system.
//!
//! # Control Law
//!
//! ```text
//! lambda = arrivals observed last tick
//! mu     = online mean of max(service_rate, 1 / response_time)
//!
//! demand = lambda
//!        + Σ_terms Σ_i max(lambda - mu * past[i], 0) * weight[i]
//!
//! servers = actuator(demand / (rho * mu))
//! ```
//!
//! Each compensation term replays the last `ceil(horizon)` decisions from
//! its own `DelayBuffer`. With no terms the law reduces to plain
//! Little's-Law-style proportional control.

pub mod actuator;
pub mod config;
pub mod controller;
pub mod delay;
pub mod error;
pub mod schedule;
pub mod stats;
pub mod types;

pub use actuator::ActuatorPolicy;
pub use config::SimulationConfig;
pub use controller::{CapacityController, Compensation};
pub use delay::DelayBuffer;
pub use error::{ConfigError, ConfigResult, ScheduleError, ScheduleResult};
pub use schedule::{Discretized, Rate, RateSchedule};
pub use types::Observation;
