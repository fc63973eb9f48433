//! Controller contract.
//!
//! The engine never looks inside a genome or a controller. It only asks a
//! controller to respond to sensor readings and asks the genetics to express
//! or cross genomes. Anything implementing these traits can drive animals.

use crate::core::error::{BreedError, ControllerError};
use crate::swarm::pheromone::PheromoneKind;
use rand::rngs::StdRng;
use std::sync::Arc;

/// What an animal smells on one pheromone channel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorReading {
    /// Summed field intensity
    pub value: f32,
    /// Bounded bearing of the gradient relative to the heading, in [-1, 1]
    pub bearing: f32,
}

/// A trail the controller wants to lay at the animal's current position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Emission {
    pub kind: PheromoneKind,
    pub amount: f32,
    pub radius: f32,
}

/// Motor output for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
    /// Multiplier on the base linear speed
    pub forward: f32,
    /// Multiplier on the base angular speed (positive = counter-clockwise)
    pub turn: f32,
    pub emissions: Vec<Emission>,
}

/// The per-animal decision maker.
pub trait Controller: Send {
    type Genome: Send + Sync + 'static;

    fn respond(
        &mut self,
        readings: &[SensorReading],
        timestep: f32,
    ) -> Result<Response, ControllerError>;

    fn genome(&self) -> &Arc<Self::Genome>;
}

/// How genomes become controllers and how two genomes produce a third.
///
/// `crossover` runs on a background worker, so it must not touch
/// simulation state.
pub trait Genetics: Send + Sync + 'static {
    type Genome: Send + Sync + 'static;
    type Controller: Controller<Genome = Self::Genome>;

    fn express(&self, genome: Arc<Self::Genome>) -> Self::Controller;

    fn crossover(
        &self,
        a: &Self::Genome,
        b: &Self::Genome,
        rng: &mut StdRng,
    ) -> Result<Self::Genome, BreedError>;
}
