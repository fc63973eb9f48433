//! PheroSim Core v0.3.0 - Pheromone-Driven Artificial Life
//!
//! A continuous-space ecosystem: animals steer by smelling a decaying
//! pheromone field, eat food, avoid poison and predators, and breed by
//! rank-selected crossover running off the simulation thread.

pub mod core;
pub mod evolution;
pub mod swarm;
pub mod utils;

pub use crate::core::config::{PredatorConfig, SimConfig};
pub use crate::core::error::{BreedError, ConfigError, ControllerError, SimError};
pub use evolution::{Controller, Genetics, PerceptronGenetics};
pub use swarm::{SimulationEngine, TickReport, WorldSnapshot};
pub use utils::SimulationBenchmark;

/// Initialize tracing for the library.
pub fn setup_logging(level: Option<String>) {
    let filter = level.unwrap_or_else(|| "info".to_string());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
