//! Error types for schedule parsing and configuration.

use thiserror::Error;

/// Result type alias for rate schedule parsing.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Result type alias for configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while parsing a rate schedule string.
#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("invalid schedule token {token:?} at position {position}")]
    InvalidToken { position: usize, token: String },

    #[error("rate {value} at position {position} must be a non-negative real")]
    InvalidRate { position: usize, value: f64 },

    #[error("breakpoint {breakpoint} at position {position} does not follow {previous}")]
    NonIncreasingBreakpoint {
        position: usize,
        previous: i64,
        breakpoint: i64,
    },
}

/// Errors raised while loading or validating a `SimulationConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("{field}: {source}")]
    Schedule {
        field: &'static str,
        #[source]
        source: ScheduleError,
    },
}
