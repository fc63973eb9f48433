//! Configuration and error types shared across the engine.

pub mod config;
pub mod error;

pub use config::{PredatorConfig, SimConfig};
pub use error::{BreedError, ConfigError, ControllerError, SimError};
