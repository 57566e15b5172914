//! Simulation configuration.
//!
//! Built once at startup, from command-line flags or a TOML file, and
//! passed by reference to everything that needs it.
//!
//! ```toml
//! seed = 1
//! steps = 200
//! rho = 0.7
//! dt = 0.1
//! lambda = "10.0,50,30.0"
//! mu = "1.0"
//! delay = 2.0
//!
//! [compensation]
//! decision_delay = 2.0
//! actuation_delay = 0.0
//!
//! [output]
//! dir = "out"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::actuator::ActuatorPolicy;
use crate::controller::CapacityController;
use crate::error::{ConfigError, ConfigResult};
use crate::schedule::RateSchedule;

/// Largest delay window, in slots, a horizon or the actuation delay may
/// span. Each slot is one buffered `f64`.
pub const MAX_DELAY_SLOTS: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the queue engine's random generator.
    pub seed: u64,
    /// Number of control ticks to run.
    pub steps: u64,
    /// Target utilization.
    pub rho: f64,
    /// Substep length as a fraction of one tick.
    pub dt: f64,
    /// Arrival rate schedule, `v0[,t1,v1,...]`.
    pub lambda: String,
    /// Per-server service rate schedule, `v0[,t1,v1,...]`.
    pub mu: String,
    /// Provisioning lag between a decision and the servers going live.
    pub delay: f64,
    pub compensation: CompensationConfig,
    pub actuator: ActuatorPolicy,
    pub output: OutputConfig,
}

/// Delay horizons the controller compensates for, in ticks.
///
/// A horizon of zero adds no term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationConfig {
    /// Lag before a decision propagates into the system.
    pub decision_delay: f64,
    /// Externally observed actuation lag.
    pub actuation_delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub params: String,
    pub simulation: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            steps: 1,
            rho: 0.7,
            dt: 1.0,
            lambda: "1.0".to_string(),
            mu: "1.0".to_string(),
            delay: 0.0,
            compensation: CompensationConfig::default(),
            actuator: ActuatorPolicy::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("out"),
            params: "params.csv".to_string(),
            simulation: "simulation.csv".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn params_path(&self) -> PathBuf {
        self.dir.join(&self.params)
    }

    pub fn simulation_path(&self) -> PathBuf {
        self.dir.join(&self.simulation)
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with.
    ///
    /// Has no side effects.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.rho.is_finite() || self.rho <= 0.0 {
            return Err(invalid("rho", format!("must be a positive number, got {}", self.rho)));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 || self.dt > 1.0 {
            return Err(invalid("dt", format!("must be in (0, 1], got {}", self.dt)));
        }
        non_negative("delay", self.delay)?;
        within_slots("delay", (self.delay / self.dt).floor())?;
        for (field, horizon) in [
            ("compensation.decision_delay", self.compensation.decision_delay),
            ("compensation.actuation_delay", self.compensation.actuation_delay),
        ] {
            non_negative(field, horizon)?;
            within_slots(field, horizon.ceil())?;
        }
        if !self.actuator.minimum.is_finite() {
            return Err(invalid(
                "actuator.minimum",
                format!("must be finite, got {}", self.actuator.minimum),
            ));
        }
        self.lambda_schedule()?;
        self.mu_schedule()?;
        Ok(())
    }

    pub fn lambda_schedule(&self) -> ConfigResult<RateSchedule> {
        RateSchedule::parse(&self.lambda).map_err(|source| ConfigError::Schedule {
            field: "lambda",
            source,
        })
    }

    pub fn mu_schedule(&self) -> ConfigResult<RateSchedule> {
        RateSchedule::parse(&self.mu).map_err(|source| ConfigError::Schedule {
            field: "mu",
            source,
        })
    }

    /// Controller for this configuration, one term per non-zero horizon.
    pub fn controller(&self) -> CapacityController {
        let mut controller = CapacityController::new(self.rho).with_actuator(self.actuator);
        for horizon in [
            self.compensation.decision_delay,
            self.compensation.actuation_delay,
        ] {
            if horizon > 0.0 {
                controller = controller.with_compensation(horizon);
            }
        }
        controller
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn non_negative(field: &'static str, value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("must be a non-negative number, got {value}")));
    }
    Ok(())
}

fn within_slots(field: &'static str, slots: f64) -> ConfigResult<()> {
    if slots > MAX_DELAY_SLOTS as f64 {
        return Err(invalid(
            field,
            format!("spans {slots} slots, more than the limit of {MAX_DELAY_SLOTS}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScheduleError;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.output.params_path(), PathBuf::from("out/params.csv"));
        assert_eq!(
            config.output.simulation_path(),
            PathBuf::from("out/simulation.csv")
        );
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
seed = 42
steps = 300
lambda = "5.0,100,10.0"

[compensation]
decision_delay = 1.5
"#,
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.steps, 300);
        assert_eq!(config.rho, 0.7);
        assert_eq!(config.compensation.decision_delay, 1.5);
        assert_eq!(config.compensation.actuation_delay, 0.0);
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }

    #[test]
    fn toml_roundtrip_preserves_config() {
        let mut config = SimulationConfig::default();
        config.delay = 3.0;
        config.compensation.actuation_delay = 2.0;
        let text = config.to_toml_string().unwrap();
        assert_eq!(SimulationConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.toml");
        std::fs::write(&path, "rho = 0.5\ndt = 0.5\n").unwrap();
        let config = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(config.rho, 0.5);
        assert_eq!(config.dt, 0.5);
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimulationConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let cases: [(&str, fn(&mut SimulationConfig)); 9] = [
            ("rho", |c| c.rho = 0.0),
            ("rho", |c| c.rho = f64::NAN),
            ("dt", |c| c.dt = 0.0),
            ("dt", |c| c.dt = 1.5),
            ("delay", |c| c.delay = -1.0),
            ("compensation.decision_delay", |c| {
                c.compensation.decision_delay = f64::INFINITY
            }),
            ("compensation.decision_delay", |c| {
                c.compensation.decision_delay = 1e13
            }),
            ("compensation.actuation_delay", |c| {
                c.compensation.actuation_delay = (MAX_DELAY_SLOTS + 1) as f64
            }),
            ("delay", |c| {
                c.dt = 0.001;
                c.delay = 1e13;
            }),
        ];
        for (field, mutate) in cases {
            let mut config = SimulationConfig::default();
            mutate(&mut config);
            match config.validate() {
                Err(ConfigError::Invalid { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected invalid {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn validate_rejects_bad_schedule() {
        let config = SimulationConfig {
            mu: "1.0,abc".to_string(),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Schedule { field: "mu", .. })
        ));
    }

    #[test]
    fn validate_accepts_windows_at_the_slot_limit() {
        let mut config = SimulationConfig::default();
        config.compensation.decision_delay = MAX_DELAY_SLOTS as f64;
        config.delay = MAX_DELAY_SLOTS as f64;
        config.validate().unwrap();
    }

    #[test]
    fn validate_accepts_saturated_rho() {
        let config = SimulationConfig {
            rho: 1.2,
            ..SimulationConfig::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_negative_rate() {
        let config = SimulationConfig {
            lambda: "1.0,5,-2.0".to_string(),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Schedule {
                field: "lambda",
                source: ScheduleError::InvalidRate { position: 2, .. },
            })
        ));
    }

    #[test]
    fn controller_gets_one_term_per_horizon() {
        let mut config = SimulationConfig::default();
        assert!(config.controller().terms().is_empty());

        config.compensation.decision_delay = 1.5;
        assert_eq!(config.controller().terms().len(), 1);

        config.compensation.actuation_delay = 2.0;
        let controller = config.controller();
        assert_eq!(controller.terms().len(), 2);
        assert_eq!(controller.terms()[1].horizon(), 2.0);
        assert_eq!(controller.rho(), 0.7);
    }
}
