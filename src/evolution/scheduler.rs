//! Continuous-time event timers.
//!
//! Each timer counts down by the tick's timestep and, on crossing zero, fires
//! once and re-arms with a fresh exponential interval. Multiple crossings in
//! one long tick still fire only once.

use crate::core::config::SimConfig;
use crate::core::error::ConfigError;
use rand::Rng;
use rand_distr::{Distribution, Exp};
use tracing::debug;

/// Which events fired this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduledEvents {
    pub spawn_food: bool,
    pub spawn_poison: bool,
    pub breed: bool,
}

#[derive(Clone, Debug)]
struct Timer {
    remaining: f32,
    interval: Exp<f32>,
}

impl Timer {
    fn new<R: Rng + ?Sized>(
        field: &'static str,
        mean_period: f32,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let interval = Exp::new(1.0 / mean_period).map_err(|e| {
            ConfigError::invalid(field, format!("bad mean period {mean_period}: {e}"))
        })?;
        Ok(Self {
            remaining: interval.sample(rng),
            interval,
        })
    }

    fn advance<R: Rng + ?Sized>(&mut self, timestep: f32, rng: &mut R) -> bool {
        self.remaining -= timestep;
        if self.remaining <= 0.0 {
            self.remaining = self.interval.sample(rng);
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Debug)]
pub struct EventScheduler {
    food: Timer,
    poison: Timer,
    breeding: Timer,
}

impl EventScheduler {
    pub fn new<R: Rng + ?Sized>(
        food_period: f32,
        poison_period: f32,
        breeding_period: f32,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            food: Timer::new("food_period", food_period, rng)?,
            poison: Timer::new("poison_period", poison_period, rng)?,
            breeding: Timer::new("breeding_period", breeding_period, rng)?,
        })
    }

    pub fn from_config<R: Rng + ?Sized>(cfg: &SimConfig, rng: &mut R) -> Result<Self, ConfigError> {
        Self::new(cfg.food_period, cfg.poison_period, cfg.breeding_period, rng)
    }

    pub fn advance<R: Rng + ?Sized>(&mut self, timestep: f32, rng: &mut R) -> ScheduledEvents {
        let events = ScheduledEvents {
            spawn_food: self.food.advance(timestep, rng),
            spawn_poison: self.poison.advance(timestep, rng),
            breed: self.breeding.advance(timestep, rng),
        };
        if events != ScheduledEvents::default() {
            debug!("[Scheduler] fired {:?}", events);
        }
        events
    }

    /// Seconds until the next (food, poison, breeding) event.
    pub fn remaining(&self) -> (f32, f32, f32) {
        (self.food.remaining, self.poison.remaining, self.breeding.remaining)
    }
}
