//! Shared per-tick types.

/// What the simulated system reported over one control tick.
///
/// Produced by the simulation driver and fed to the controller on the
/// following tick. `Default` is the all-zero observation used before the
/// first tick has run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Observation {
    /// Arrivals over the tick.
    pub arrivals: f64,
    /// Completions per realized server. NaN when no servers were active.
    pub service_rate: f64,
    /// Mean response time in time units. NaN when nothing completed.
    pub mean_response_time: f64,
    /// Queue length at the end of the tick.
    pub queue_length: u64,
    /// Mean realized server count across the tick's substeps.
    pub average_servers: f64,
}
