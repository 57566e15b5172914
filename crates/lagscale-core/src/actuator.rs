//! Actuator quantization.

use serde::{Deserialize, Serialize};

/// Rounds a continuous capacity to whole servers and floors it at `minimum`.
///
/// Rounding is half-to-even, so `2.5` becomes `2.0` and `3.5` becomes `4.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorPolicy {
    pub minimum: f64,
}

impl ActuatorPolicy {
    pub fn new(minimum: f64) -> Self {
        Self { minimum }
    }

    pub fn apply(&self, x: f64) -> f64 {
        // f64::max ignores a NaN operand, so NaN input lands on the floor.
        x.round_ties_even().max(self.minimum)
    }
}

impl Default for ActuatorPolicy {
    fn default() -> Self {
        Self { minimum: 1.0 }
    }
}
