//! Food and poison.
//!
//! Both share one lifecycle: trade energy with animals in reach, decay,
//! and periodically re-emit a trail of their own kind while anything is left.

use super::animal::Animal;
use super::pheromone::{PheromoneField, PheromoneKind};
use super::torus::Torus;
use crate::core::config::SimConfig;
use crate::evolution::controller::Controller;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Food,
    Poison,
}

impl ObjectKind {
    pub fn pheromone(self) -> PheromoneKind {
        match self {
            ObjectKind::Food => PheromoneKind::FOOD,
            ObjectKind::Poison => PheromoneKind::POISON,
        }
    }
}

/// Exchange and emission constants for one tick.
#[derive(Clone, Copy, Debug)]
pub struct ObjectRules {
    pub torus: Torus,
    pub interaction_radius: f32,
    pub max_energy: f32,
    pub decay: f32,
    pub emission_period: f32,
    pub emission_radius: f32,
}

impl ObjectRules {
    pub fn from_config(cfg: &SimConfig) -> Self {
        Self {
            torus: Torus::new(cfg.world_width, cfg.world_height),
            interaction_radius: cfg.interaction_radius,
            max_energy: cfg.max_energy,
            decay: cfg.object_decay,
            emission_period: cfg.emission_period,
            emission_radius: cfg.emission_radius,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorldObject {
    pub kind: ObjectKind,
    pub x: f32,
    pub y: f32,
    pub amount: f32,
    /// Seconds until the next trail emission
    pub clock: f32,
}

impl WorldObject {
    pub fn new(kind: ObjectKind, x: f32, y: f32, amount: f32, emission_period: f32) -> Self {
        Self {
            kind,
            x,
            y,
            amount,
            clock: emission_period,
        }
    }

    pub fn food(x: f32, y: f32, amount: f32, emission_period: f32) -> Self {
        Self::new(ObjectKind::Food, x, y, amount, emission_period)
    }

    pub fn poison(x: f32, y: f32, amount: f32, emission_period: f32) -> Self {
        Self::new(ObjectKind::Poison, x, y, amount, emission_period)
    }

    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.amount <= 0.0
    }

    /// Trade energy with animals in reach (population order, stopping once
    /// empty), decay, and maybe lay a fresh trail into `sink`.
    pub fn update<C: Controller>(
        &mut self,
        animals: &mut [Animal<C>],
        sink: &mut PheromoneField,
        timestep: f32,
        rules: &ObjectRules,
    ) {
        let reach = rules.interaction_radius * rules.interaction_radius;
        for animal in animals.iter_mut() {
            if self.amount <= 0.0 {
                break;
            }
            let d2 = rules.torus.distance_sq(animal.x, animal.y, self.x, self.y);
            if !animal.is_alive() || d2 >= reach {
                continue;
            }
            match self.kind {
                ObjectKind::Food => {
                    let consume = self.amount.min(rules.max_energy - animal.energy).max(0.0);
                    self.amount -= consume;
                    animal.energy += consume;
                }
                ObjectKind::Poison => {
                    let consume = self.amount.min(animal.energy);
                    self.amount -= consume;
                    animal.energy -= consume;
                }
            }
        }

        self.clock -= timestep;
        self.amount -= timestep * rules.decay;
        if self.amount > 0.0 && self.clock <= 0.0 {
            self.clock = rules.emission_period;
            sink.add_source(
                self.kind.pheromone(),
                self.x,
                self.y,
                self.amount,
                rules.emission_radius,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::controller::Response;
    use crate::swarm::animal::tests::still;

    fn rules(decay: f32) -> ObjectRules {
        ObjectRules {
            torus: Torus::new(100.0, 100.0),
            interaction_radius: 8.0,
            max_energy: 100.0,
            decay,
            emission_period: 1.0,
            emission_radius: 10.0,
        }
    }

    fn field() -> PheromoneField {
        PheromoneField::new(4, Torus::new(100.0, 100.0), 2.0, 0.1)
    }

    #[test]
    fn food_energy_is_conserved_for_single_animal() {
        let mut animals = vec![still(Response::default())];
        animals[0].teleport(52.0, 50.0, 0.0);
        animals[0].energy = 95.0;
        let mut food = WorldObject::food(50.0, 50.0, 10.0, 1.0);
        let mut sink = field();

        let (energy_before, amount_before) = (animals[0].energy, food.amount);
        food.update(&mut animals, &mut sink, 0.1, &rules(0.0));

        assert_eq!(animals[0].energy - energy_before, amount_before - food.amount);
        assert_eq!(animals[0].energy, 100.0);
        assert_eq!(food.amount, 5.0);
    }

    #[test]
    fn poison_drains_and_never_goes_below_zero() {
        let mut animals = vec![still(Response::default())];
        animals[0].teleport(50.0, 50.0, 0.0);
        animals[0].energy = 4.0;
        let mut poison = WorldObject::poison(50.0, 50.0, 10.0, 1.0);
        poison.update(&mut animals, &mut field(), 0.1, &rules(0.0));
        assert_eq!(animals[0].energy, 0.0);
        assert_eq!(poison.amount, 6.0);
    }

    #[test]
    fn stops_once_empty_in_population_order() {
        let mut animals = vec![still(Response::default()), still(Response::default())];
        for a in &mut animals {
            a.teleport(50.0, 50.0, 0.0);
            a.energy = 90.0;
        }
        let mut food = WorldObject::food(50.0, 50.0, 10.0, 1.0);
        food.update(&mut animals, &mut field(), 0.1, &rules(0.0));
        assert_eq!(animals[0].energy, 100.0);
        assert_eq!(animals[1].energy, 90.0);
        assert!(food.is_depleted());
    }

    #[test]
    fn out_of_reach_is_untouched_but_seam_counts() {
        let mut animals = vec![still(Response::default()), still(Response::default())];
        animals[0].teleport(70.0, 50.0, 0.0);
        animals[1].teleport(97.0, 50.0, 0.0);
        let mut food = WorldObject::food(2.0, 50.0, 10.0, 1.0);
        food.update(&mut animals, &mut field(), 0.1, &rules(0.0));
        assert_eq!(animals[0].energy, 50.0);
        assert_eq!(animals[1].energy, 60.0);
    }

    #[test]
    fn emits_when_clock_expires_and_decays() {
        let mut food = WorldObject::food(20.0, 30.0, 10.0, 1.0);
        let mut sink = field();
        let mut animals: Vec<Animal<_>> = vec![still(Response::default())];
        animals[0].teleport(80.0, 80.0, 0.0);

        food.update(&mut animals, &mut sink, 0.5, &rules(1.0));
        assert!(sink.is_empty());
        assert_eq!(food.amount, 9.5);

        food.update(&mut animals, &mut sink, 0.5, &rules(1.0));
        assert_eq!(sink.len(), 1);
        let s = &sink.sources()[0];
        assert_eq!(s.kind, PheromoneKind::FOOD);
        assert_eq!((s.x, s.y, s.amount, s.radius), (20.0, 30.0, 9.0, 10.0));
        assert_eq!(food.clock, 1.0);
    }

    #[test]
    fn empty_object_does_not_emit() {
        let mut poison = WorldObject::poison(20.0, 30.0, 0.5, 1.0);
        let mut sink = field();
        let mut animals: Vec<Animal<_>> = vec![still(Response::default())];
        animals[0].teleport(80.0, 80.0, 0.0);
        poison.update(&mut animals, &mut sink, 1.0, &rules(1.0));
        assert!(poison.is_depleted());
        assert!(sink.is_empty());
    }
}
