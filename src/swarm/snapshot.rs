//! Read-only world snapshot handed to renderers once per frame.

use super::objects::ObjectKind;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimalView {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub energy: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PheromoneView {
    pub x: f32,
    pub y: f32,
    pub kind: usize,
    /// Normalized power in (0, 1]
    pub power: f32,
    pub radius: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectView {
    pub x: f32,
    pub y: f32,
    pub kind: ObjectKind,
    pub amount: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredatorView {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub elapsed: f32,
    pub width: f32,
    pub height: f32,
    pub animals: Vec<AnimalView>,
    pub pheromones: Vec<PheromoneView>,
    pub objects: Vec<ObjectView>,
    pub predators: Vec<PredatorView>,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Mean energy of the live population, 0 when empty.
    pub fn mean_energy(&self) -> f32 {
        if self.animals.is_empty() {
            0.0
        } else {
            self.animals.iter().map(|a| a.energy).sum::<f32>() / self.animals.len() as f32
        }
    }
}
