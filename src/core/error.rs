//! Error taxonomy for the simulation.
//!
//! Per-entity failures (controllers, breeding jobs) are recoverable and only
//! ever remove the entity involved. Configuration errors are fatal and are
//! raised before the first tick.

use thiserror::Error;

/// Rejected configuration. Raised by [`crate::SimConfig::validate`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// A controller could not produce a response for one animal this tick.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("controller expected {expected} sensor inputs, got {got}")]
    InputArity { expected: usize, got: usize },
    #[error("controller produced a non-finite output")]
    NonFinite,
    #[error("controller failure: {0}")]
    Other(String),
}

/// A crossover job failed; the pending child is dropped.
#[derive(Debug, Error)]
pub enum BreedError {
    #[error("parent genomes are incompatible: {0}")]
    Incompatible(String),
    #[error("crossover job was cancelled before producing a genome")]
    Cancelled,
    #[error("crossover failure: {0}")]
    Other(String),
}

/// Top-level error for building a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("seed genome pool is empty")]
    NoSeedGenomes,
    #[error("failed to start worker pool: {0}")]
    Runtime(String),
}
