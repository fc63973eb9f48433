//! Predators: mobile hazards that hunt the nearest animal they can see
//! and drain everything in reach, leaving a scent trail behind.

use super::animal::{normalize_angle, Animal};
use super::objects::ObjectRules;
use super::pheromone::{PheromoneField, PheromoneKind};
use crate::core::config::PredatorConfig;
use crate::evolution::controller::Controller;
use rand::Rng;
use rand_distr::{Distribution, Normal};

#[derive(Clone, Debug, PartialEq)]
pub struct Predator {
    pub x: f32,
    pub y: f32,
    pub theta: f32,
    clock: f32,
}

impl Predator {
    pub fn new(x: f32, y: f32, theta: f32, emission_period: f32) -> Self {
        Self {
            x,
            y,
            theta: normalize_angle(theta),
            clock: emission_period,
        }
    }

    /// Displacement to the nearest live animal within `radius`, if any.
    fn nearest_prey<C: Controller>(
        &self,
        animals: &[Animal<C>],
        radius: f32,
        rules: &ObjectRules,
    ) -> Option<(f32, f32)> {
        let limit = radius * radius;
        animals
            .iter()
            .filter(|a| a.is_alive())
            .map(|a| rules.torus.delta(a.x, a.y, self.x, self.y))
            .filter(|(dx, dy)| dx * dx + dy * dy <= limit)
            .min_by(|(ax, ay), (bx, by)| {
                (ax * ax + ay * ay)
                    .partial_cmp(&(bx * bx + by * by))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    pub fn update<C: Controller, R: Rng + ?Sized>(
        &mut self,
        animals: &mut [Animal<C>],
        sink: &mut PheromoneField,
        timestep: f32,
        cfg: &PredatorConfig,
        rules: &ObjectRules,
        rng: &mut R,
    ) {
        // Steer
        match self.nearest_prey(animals, cfg.sense_radius, rules) {
            Some((dx, dy)) if dx != 0.0 || dy != 0.0 => {
                self.theta = normalize_angle(dy.atan2(dx));
            }
            Some(_) => {}
            None => {
                if let Ok(jitter) = Normal::new(0.0f32, cfg.wander * timestep.sqrt()) {
                    self.theta = normalize_angle(self.theta + jitter.sample(rng));
                }
            }
        }

        // Move
        let step = cfg.speed * timestep;
        let (x, y) = rules
            .torus
            .wrap(self.x + self.theta.cos() * step, self.y + self.theta.sin() * step);
        self.x = x;
        self.y = y;

        // Bite
        let reach = rules.interaction_radius * rules.interaction_radius;
        let bite = cfg.bite_rate * timestep;
        for animal in animals.iter_mut() {
            let d2 = rules.torus.distance_sq(animal.x, animal.y, self.x, self.y);
            if animal.is_alive() && d2 < reach {
                animal.energy -= bite.min(animal.energy);
            }
        }

        // Scent
        self.clock -= timestep;
        if self.clock <= 0.0 {
            self.clock = rules.emission_period;
            sink.add_source(
                PheromoneKind::PREDATOR,
                self.x,
                self.y,
                cfg.bite_rate.max(1.0),
                rules.emission_radius,
            );
        }
    }
}
