//! lagscale-sim — drives the capacity controller against a simulated queue.
//!
//! # Architecture
//!
//! ```text
//! run(config)
//!   └── for each tick
//!         ├── CapacityController::calculate_from(previous observation)
//!         ├── SimulationDriver::run(desired)
//!         │     └── per substep: actuation DelayBuffer → QueueEngine::progress
//!         └── SimulationWriter::write_row
//! ```
//!
//! The controller always acts on the previous tick's observation; the
//! first tick sees `Observation::default()` and holds at the actuator floor.

pub mod driver;
pub mod engine;
pub mod error;
pub mod report;
pub mod runner;

pub use driver::SimulationDriver;
pub use engine::{MmsEngine, Progress, QueueEngine};
pub use error::{SimError, SimResult};
pub use report::{SimulationWriter, write_params};
pub use runner::{Summary, run};
