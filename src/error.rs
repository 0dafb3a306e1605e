//! Error types for configuration and startup wiring
//!
//! The running simulation never returns errors: full pools, stale handles and
//! ambiguous collision pairs are treated as no-ops. Only balance data and
//! missing collaborators are rejected, and only before the first tick.

use thiserror::Error;

use crate::sim::EnemyKind;

/// Invalid balance data.
#[derive(Debug, Error)]
pub enum TuningError {
    /// No wave definitions at all
    #[error("wave list is empty")]
    NoWaves,
    /// Waves must be ordered by start time
    #[error("wave {index} starts at {start_ms}ms, before the previous wave ({previous_ms}ms)")]
    WavesOutOfOrder {
        /// Offending wave
        index: usize,
        /// Its start time
        start_ms: f64,
        /// Start time of the wave before it
        previous_ms: f64,
    },
    /// A wave that can spawn nothing
    #[error("wave {0} allows no enemy kinds")]
    EmptyWave(usize),
    /// Spawn cadence must be positive
    #[error("wave {index} has non-positive spawn interval {interval_ms}ms")]
    BadInterval {
        /// Offending wave
        index: usize,
        /// Configured interval
        interval_ms: f64,
    },
    /// Pools must hold at least one slot
    #[error("pool capacity must be at least 1")]
    ZeroPoolCapacity,
    /// Negative spawn radius
    #[error("spawn radius {0} is negative")]
    NegativeSpawnRadius(f64),
    /// A wave references a kind that has no stats entry
    #[error("no stats configured for {0:?}")]
    MissingStats(EnemyKind),
    /// Malformed JSON
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Missing or invalid collaborators at build time.
#[derive(Debug, Error)]
pub enum WiringError {
    /// A required collaborator was never supplied to the builder
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),
    /// Tuning failed validation
    #[error(transparent)]
    Tuning(#[from] TuningError),
}
