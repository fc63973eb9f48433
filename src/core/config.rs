use super::error::ConfigError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Predator behaviour parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PredatorConfig {
    /// Distance units per second
    pub speed: f32,
    /// How far a predator can see prey
    pub sense_radius: f32,
    /// Energy drained per second from each animal in reach
    pub bite_rate: f32,
    /// Standard deviation of the heading jitter (radians/sqrt(s)) while wandering
    pub wander: f32,
}

impl Default for PredatorConfig {
    fn default() -> Self {
        PredatorConfig {
            speed: 20.0,
            sense_radius: 60.0,
            bite_rate: 40.0,
            wander: 1.0,
        }
    }
}

/// Main hyperparameters for the simulation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub world_width: f32,
    pub world_height: f32,
    pub animal_count: usize,
    pub predator_count: usize,
    /// Number of pheromone channels. Channels 0..3 are food, poison and predator scent.
    pub pheromone_kinds: usize,

    pub base_speed: f32,
    pub base_angular_speed: f32,

    // Mean periods (seconds) of the exponential event timers
    pub food_period: f32,
    pub poison_period: f32,
    pub breeding_period: f32,
    /// Per-rank stop probability used by rank selection
    pub breeding_fitness: f32,

    pub object_decay: f32,
    pub object_amount: f32,
    pub interaction_radius: f32,
    pub emission_period: f32,
    pub emission_radius: f32,

    /// Time constant of the pheromone power decay
    pub pheromone_lifetime: f32,
    pub prune_threshold: f32,

    pub timestep: f32,
    pub max_energy: f32,
    pub spawn_energy: f32,
    /// Energy burned per second at rest; moving at full speed burns the same amount again.
    /// Off (0) unless set.
    pub metabolism: f32,

    pub predator: PredatorConfig,

    /// Size of the dedicated agent-update thread pool. `None` uses the global rayon pool.
    pub max_threads: Option<usize>,
    pub seed: Option<u64>,
    /// Emit an info summary every N ticks (0 disables)
    pub log_every: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            world_width: 800.0,
            world_height: 600.0,
            animal_count: 50,
            predator_count: 2,
            pheromone_kinds: 4,
            base_speed: 30.0,
            base_angular_speed: 3.0,
            food_period: 0.5,
            poison_period: 2.0,
            breeding_period: 1.0,
            breeding_fitness: 0.3,
            object_decay: 0.1,
            object_amount: 10.0,
            interaction_radius: 8.0,
            emission_period: 1.0,
            emission_radius: 10.0,
            pheromone_lifetime: 2.0,
            prune_threshold: 0.1,
            timestep: 0.05,
            max_energy: 100.0,
            spawn_energy: 100.0,
            metabolism: 0.0,
            predator: PredatorConfig::default(),
            max_threads: None,
            seed: None,
            log_every: 100,
        }
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: SimConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("loading config {}", path.display()))
    }

    /// Reject configurations that cannot run. Called before the first tick.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("food_period", self.food_period),
            ("poison_period", self.poison_period),
            ("breeding_period", self.breeding_period),
            ("emission_period", self.emission_period),
            ("emission_radius", self.emission_radius),
            ("pheromone_lifetime", self.pheromone_lifetime),
            ("timestep", self.timestep),
            ("max_energy", self.max_energy),
            ("interaction_radius", self.interaction_radius),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be positive and finite, got {value}"),
                ));
            }
        }

        let non_negative = [
            ("base_speed", self.base_speed),
            ("base_angular_speed", self.base_angular_speed),
            ("object_decay", self.object_decay),
            ("object_amount", self.object_amount),
            ("metabolism", self.metabolism),
            ("predator.speed", self.predator.speed),
            ("predator.sense_radius", self.predator.sense_radius),
            ("predator.bite_rate", self.predator.bite_rate),
            ("predator.wander", self.predator.wander),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must be non-negative and finite, got {value}"),
                ));
            }
        }

        if !(self.breeding_fitness > 0.0 && self.breeding_fitness <= 1.0) {
            return Err(ConfigError::invalid(
                "breeding_fitness",
                format!("must lie in (0, 1], got {}", self.breeding_fitness),
            ));
        }
        if !(self.prune_threshold > 0.0 && self.prune_threshold < 1.0) {
            return Err(ConfigError::invalid(
                "prune_threshold",
                format!("must lie in (0, 1), got {}", self.prune_threshold),
            ));
        }
        if self.pheromone_kinds < 3 {
            return Err(ConfigError::invalid(
                "pheromone_kinds",
                "food, poison and predator channels need at least 3 kinds",
            ));
        }
        if self.spawn_energy <= 0.0 || self.spawn_energy > self.max_energy {
            return Err(ConfigError::invalid(
                "spawn_energy",
                format!("must lie in (0, max_energy], got {}", self.spawn_energy),
            ));
        }
        if self.max_threads == Some(0) {
            return Err(ConfigError::invalid("max_threads", "must be at least 1"));
        }
        Ok(())
    }

    /// Age at which a fresh pheromone source drops below the prune threshold.
    pub fn pheromone_horizon(&self) -> f32 {
        self.pheromone_lifetime * (1.0 / self.prune_threshold).ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_world_extent() {
        let cfg = SimConfig {
            world_width: 0.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Invalid {
                field: "world_width",
                ..
            })
        ));
    }

    #[test]
    fn rejects_non_positive_periods() {
        for cfg in [
            SimConfig {
                food_period: 0.0,
                ..SimConfig::default()
            },
            SimConfig {
                poison_period: -1.0,
                ..SimConfig::default()
            },
            SimConfig {
                breeding_period: f32::NAN,
                ..SimConfig::default()
            },
        ] {
            assert!(cfg.validate().is_err());
        }
    }

    #[test]
    fn rejects_too_few_pheromone_kinds() {
        let cfg = SimConfig {
            pheromone_kinds: 2,
            ..SimConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let cfg = SimConfig::from_json_str(r#"{"world_width": 100, "animal_count": 3}"#)
            .expect("valid config");
        assert_eq!(cfg.world_width, 100.0);
        assert_eq!(cfg.animal_count, 3);
        assert_eq!(cfg.world_height, SimConfig::default().world_height);
        assert_eq!(cfg.predator, PredatorConfig::default());
    }

    #[test]
    fn invalid_json_value_is_rejected_after_parse() {
        let err = SimConfig::from_json_str(r#"{"timestep": -0.5}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "timestep",
                ..
            }
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SimConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn horizon_matches_threshold() {
        let cfg = SimConfig::default();
        let power = (-cfg.pheromone_horizon() / cfg.pheromone_lifetime).exp();
        assert!((power - cfg.prune_threshold).abs() < 1e-5);
    }
}
