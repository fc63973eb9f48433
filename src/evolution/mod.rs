//! Evolution Layer
//!
//! Controllers and the genetics that produce them, continuous-time event
//! timers, and the background breeding pipeline.

pub mod breeding;
pub mod controller;
pub mod perceptron;
pub mod scheduler;

pub use breeding::{select_parent, select_parents, BreedingPipeline, BreedingStats};
pub use controller::{Controller, Emission, Genetics, Response, SensorReading};
pub use perceptron::{PerceptronController, PerceptronGenetics, PerceptronGenome};
pub use scheduler::{EventScheduler, ScheduledEvents};
