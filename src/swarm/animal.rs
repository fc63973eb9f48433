//! Animals: position, heading and energy around an opaque controller.

use super::pheromone::{PheromoneField, PheromoneSource};
use super::torus::Torus;
use crate::core::config::SimConfig;
use crate::core::error::ControllerError;
use crate::evolution::controller::{Controller, SensorReading};
use std::f32::consts::TAU;
use std::sync::Arc;

/// Motion constants shared by every animal for one tick.
#[derive(Clone, Copy, Debug)]
pub struct Kinematics {
    pub torus: Torus,
    pub base_speed: f32,
    pub base_angular_speed: f32,
    pub metabolism: f32,
    pub max_energy: f32,
    pub pheromone_lifetime: f32,
}

impl Kinematics {
    pub fn from_config(cfg: &SimConfig) -> Self {
        Self {
            torus: Torus::new(cfg.world_width, cfg.world_height),
            base_speed: cfg.base_speed,
            base_angular_speed: cfg.base_angular_speed,
            metabolism: cfg.metabolism,
            max_energy: cfg.max_energy,
            pheromone_lifetime: cfg.pheromone_lifetime,
        }
    }
}

pub struct Animal<C: Controller> {
    pub x: f32,
    pub y: f32,
    /// Radians in [0, 2π)
    pub theta: f32,
    pub energy: f32,
    controller: C,
}

impl<C: Controller> Animal<C> {
    pub fn new(controller: C, energy: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            theta: 0.0,
            energy,
            controller,
        }
    }

    pub fn teleport(&mut self, x: f32, y: f32, theta: f32) {
        self.x = x;
        self.y = y;
        self.theta = normalize_angle(theta);
    }

    pub fn genome(&self) -> &Arc<C::Genome> {
        self.controller.genome()
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }

    /// One reading per pheromone channel: summed intensity plus the bounded
    /// bearing of the summed gradient.
    pub fn sense(&self, field: &PheromoneField) -> Vec<SensorReading> {
        field
            .sense_all(self.x, self.y)
            .into_iter()
            .map(|s| SensorReading {
                value: s.value,
                bearing: relative_bearing(s.grad_x, s.grad_y, self.theta),
            })
            .collect()
    }

    /// Ask the controller for a move, integrate it, and return the trails it laid.
    pub fn update(
        &mut self,
        readings: &[SensorReading],
        timestep: f32,
        kin: &Kinematics,
    ) -> Result<Vec<PheromoneSource>, ControllerError> {
        let response = self.controller.respond(readings, timestep)?;
        if !(response.forward.is_finite() && response.turn.is_finite()) {
            return Err(ControllerError::NonFinite);
        }

        let turn = response.turn * kin.base_angular_speed * timestep;
        self.theta = normalize_angle(self.theta + turn);
        let step = response.forward * kin.base_speed * timestep;
        let (x, y) = kin
            .torus
            .wrap(self.x + self.theta.cos() * step, self.y + self.theta.sin() * step);
        self.x = x;
        self.y = y;

        self.energy -= kin.metabolism * timestep * (1.0 + response.forward.abs());
        self.energy = self.energy.min(kin.max_energy);

        Ok(response
            .emissions
            .into_iter()
            .filter(|e| e.amount > 0.0 && e.radius > 0.0)
            .map(|e| {
                PheromoneSource::new(
                    e.kind,
                    self.x,
                    self.y,
                    e.amount,
                    e.radius,
                    kin.pheromone_lifetime,
                )
            })
            .collect())
    }
}

/// Bring an angle into [0, 2π).
#[inline]
pub fn normalize_angle(theta: f32) -> f32 {
    let t = theta.rem_euclid(TAU);
    if t >= TAU {
        0.0
    } else {
        t
    }
}

/// `tanh(tan((bearing - heading) / 2))`: ~0 when the gradient is dead ahead,
/// saturating smoothly to ±1 as it swings round behind. Zero when there is no gradient.
#[inline]
pub fn relative_bearing(grad_x: f32, grad_y: f32, theta: f32) -> f32 {
    if grad_x == 0.0 && grad_y == 0.0 {
        return 0.0;
    }
    let half = (grad_y.atan2(grad_x) - theta) / 2.0;
    half.tan().tanh()
}
