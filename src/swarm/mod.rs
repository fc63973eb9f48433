//! Swarm World
//!
//! Animals, food, poison and predators on a wrapping 2-D world, coupled
//! through a continuous pheromone field.

pub mod animal;
pub mod engine;
pub mod objects;
pub mod pheromone;
pub mod predator;
pub mod snapshot;
pub mod torus;

pub use animal::{Animal, Kinematics};
pub use engine::{genomes_by_energy, SimulationEngine, TickReport};
pub use objects::{ObjectKind, ObjectRules, WorldObject};
pub use pheromone::{FieldSample, PheromoneField, PheromoneKind, PheromoneSource};
pub use predator::Predator;
pub use snapshot::WorldSnapshot;
pub use torus::Torus;
