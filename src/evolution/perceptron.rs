//! Reference controller: a single tanh layer.
//!
//! Inputs are `(ln(1 + value), bearing)` for every pheromone channel plus a
//! bias. Outputs are forward drive, turn, and one emission gate per channel.

use super::controller::{Controller, Emission, Genetics, Response, SensorReading};
use crate::core::error::{BreedError, ControllerError};
use crate::swarm::pheromone::PheromoneKind;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Flat weight matrix, row-major by output. Each row ends with its bias.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerceptronGenome {
    pub channels: usize,
    pub weights: Vec<f32>,
}

impl PerceptronGenome {
    pub fn inputs(&self) -> usize {
        2 * self.channels
    }

    pub fn outputs(&self) -> usize {
        2 + self.channels
    }

    fn row_len(&self) -> usize {
        self.inputs() + 1
    }

    pub fn expected_len(channels: usize) -> usize {
        (2 + channels) * (2 * channels + 1)
    }
}

pub struct PerceptronController {
    genome: Arc<PerceptronGenome>,
    emit_threshold: f32,
    emit_amount: f32,
    emit_radius: f32,
    input: Vec<f32>,
}

impl Controller for PerceptronController {
    type Genome = PerceptronGenome;

    fn respond(
        &mut self,
        readings: &[SensorReading],
        _timestep: f32,
    ) -> Result<Response, ControllerError> {
        let g = &self.genome;
        if readings.len() != g.channels {
            return Err(ControllerError::InputArity {
                expected: g.channels,
                got: readings.len(),
            });
        }
        if g.weights.len() != PerceptronGenome::expected_len(g.channels) {
            return Err(ControllerError::Other(format!(
                "genome has {} weights, expected {}",
                g.weights.len(),
                PerceptronGenome::expected_len(g.channels)
            )));
        }

        self.input.clear();
        for r in readings {
            self.input.push(r.value.max(0.0).ln_1p());
            self.input.push(r.bearing);
        }

        let row_len = g.row_len();
        let mut out = Vec::with_capacity(g.outputs());
        for row in g.weights.chunks_exact(row_len) {
            let (w, bias) = row.split_at(row_len - 1);
            let z: f32 = w.iter().zip(&self.input).map(|(w, x)| w * x).sum::<f32>() + bias[0];
            let a = z.tanh();
            if !a.is_finite() {
                return Err(ControllerError::NonFinite);
            }
            out.push(a);
        }

        let emissions = out[2..]
            .iter()
            .enumerate()
            .filter(|(_, gate)| **gate > self.emit_threshold)
            .map(|(channel, gate)| Emission {
                kind: PheromoneKind(channel),
                amount: gate * self.emit_amount,
                radius: self.emit_radius,
            })
            .collect();

        Ok(Response {
            forward: (out[0] + 1.0) / 2.0,
            turn: out[1],
            emissions,
        })
    }

    fn genome(&self) -> &Arc<PerceptronGenome> {
        &self.genome
    }
}

/// Genetics for [`PerceptronGenome`]: uniform crossover plus Gaussian mutation.
#[derive(Clone, Debug)]
pub struct PerceptronGenetics {
    pub channels: usize,
    pub mutation_rate: f32,
    pub mutation_sigma: f32,
    pub emit_threshold: f32,
    pub emit_amount: f32,
    pub emit_radius: f32,
}

impl PerceptronGenetics {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            mutation_rate: 0.05,
            mutation_sigma: 0.3,
            emit_threshold: 0.5,
            emit_amount: 5.0,
            emit_radius: 10.0,
        }
    }

    pub fn random_genome<R: Rng + ?Sized>(&self, rng: &mut R) -> PerceptronGenome {
        let len = PerceptronGenome::expected_len(self.channels);
        let weights = match Normal::new(0.0f32, 1.0) {
            Ok(normal) => (0..len).map(|_| normal.sample(rng)).collect(),
            Err(_) => vec![0.0; len],
        };
        PerceptronGenome {
            channels: self.channels,
            weights,
        }
    }

    fn mutate(&self, genome: &mut PerceptronGenome, rng: &mut StdRng) {
        let Ok(noise) = Normal::new(0.0f32, self.mutation_sigma) else {
            return;
        };
        for w in &mut genome.weights {
            if rng.gen::<f32>() < self.mutation_rate {
                *w += noise.sample(rng);
            }
        }
    }
}

impl Genetics for PerceptronGenetics {
    type Genome = PerceptronGenome;
    type Controller = PerceptronController;

    fn express(&self, genome: Arc<PerceptronGenome>) -> PerceptronController {
        PerceptronController {
            input: Vec::with_capacity(genome.inputs()),
            genome,
            emit_threshold: self.emit_threshold,
            emit_amount: self.emit_amount,
            emit_radius: self.emit_radius,
        }
    }

    fn crossover(
        &self,
        a: &PerceptronGenome,
        b: &PerceptronGenome,
        rng: &mut StdRng,
    ) -> Result<PerceptronGenome, BreedError> {
        if a.channels != b.channels || a.weights.len() != b.weights.len() {
            return Err(BreedError::Incompatible(format!(
                "{} vs {} weights",
                a.weights.len(),
                b.weights.len()
            )));
        }
        let weights = a
            .weights
            .iter()
            .zip(&b.weights)
            .map(|(wa, wb)| if rng.gen::<bool>() { *wa } else { *wb })
            .collect();
        let mut child = PerceptronGenome {
            channels: a.channels,
            weights,
        };
        self.mutate(&mut child, rng);
        Ok(child)
    }
}
