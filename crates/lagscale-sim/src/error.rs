//! Simulation error types.

use thiserror::Error;

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] lagscale_core::ConfigError),

    #[error("failed to write {what}: {source}")]
    Write {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub type SimResult<T> = Result<T, SimError>;
