//! Simulation configuration with documented constants
//!
//! All tunable numbers live here. Every field has a serde default so a TOML file
//! only needs to name the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{Result, SimError};

/// Per-second decay rate for each need (points on the 0-100 scale)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedRates {
    pub hunger: f32,
    pub thirst: f32,
    pub energy: f32,
    pub social: f32,
    pub comfort: f32,
    /// Safety does not drain on its own; threats lower it directly
    pub safety: f32,
}

impl Default for NeedRates {
    fn default() -> Self {
        Self {
            hunger: 0.5,
            thirst: 0.7,
            energy: 0.3,
            social: 0.25,
            comfort: 0.15,
            safety: 0.0,
        }
    }
}

/// Configuration for the simulation systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === SPATIAL SYSTEM ===
    /// Side of each spatial index cell (world units)
    ///
    /// Smaller = more cells, fewer candidates per cell.
    /// Larger = fewer cells, more exact-distance checks per query.
    pub grid_cell_size: f32,

    /// Default perception radius for creatures (world units)
    ///
    /// Animals use the radius from their species table instead.
    pub perception_radius: f32,

    // === POPULATION ===
    /// Hard cap on live agents; spawns and births beyond it are refused
    pub population_cap: usize,

    /// Largest step `update` will integrate; longer frames are truncated
    pub max_delta_seconds: f32,

    /// Minimum agent count before the perception pass runs on rayon
    pub parallel_threshold: usize,

    // === NEED SYSTEM ===
    pub need_rates: NeedRates,

    /// Global multiplier on every need rate
    pub need_decay_multiplier: f32,

    /// Hunger restored per unit of food harvested
    pub food_value: f32,

    /// Thirst restored per second while drinking
    pub drink_rate: f32,

    /// Energy restored per second while resting
    pub rest_rate: f32,

    /// Social restored per second while next to a companion
    pub social_rate: f32,

    /// Comfort restored per second while idle or resting
    pub comfort_rate: f32,

    /// Safety recovered per second when no threat is perceived
    pub safety_recovery_rate: f32,

    /// Safety lost per second while a threat is perceived
    pub threat_safety_drain: f32,

    /// Hit points lost per second while hunger or thirst sits at zero
    pub starvation_damage: f32,

    // === MIND ===
    /// Emotion intensity lost per second
    pub emotion_decay_rate: f32,

    /// Maximum memories kept per agent (oldest dropped first)
    pub memory_capacity: usize,

    /// Affinity below which another agent counts as an enemy
    pub enemy_affinity_threshold: f32,

    /// Affinity gained per second of socializing
    pub social_affinity_gain: f32,

    /// Affinity lost by a victim toward its attacker per hit
    pub attack_affinity_penalty: f32,

    // === MOVEMENT & COMBAT ===
    /// Distance at which a moving agent counts as arrived
    pub arrival_distance: f32,

    /// Seconds between two strikes from the same attacker
    pub attack_cooldown: f32,

    /// Speed multiplier applied while fleeing
    pub flee_speed_multiplier: f32,

    /// Radius within which a predator sends prey fleeing
    pub predator_alarm_radius: f32,

    /// Radius for picking wander destinations
    pub wander_radius: f32,

    /// Radius for picking explore destinations
    pub explore_radius: f32,

    /// Units harvested per second while gathering
    pub harvest_rate: f32,

    // === REPRODUCTION ===
    /// Per-second chance of a birth while conditions hold
    pub reproduction_chance: f32,

    /// Seconds an agent waits after giving birth
    pub reproduction_cooldown: f32,

    // === WORLD ===
    /// Fraction of a renewable resource's maximum regrown per second
    pub resource_regen_rate: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_cell_size: 8.0,
            perception_radius: 12.0,

            population_cap: 5000,
            max_delta_seconds: 0.25,
            parallel_threshold: 1000,

            need_rates: NeedRates::default(),
            need_decay_multiplier: 1.0,
            food_value: 6.0,
            drink_rate: 25.0,
            rest_rate: 12.0,
            social_rate: 15.0,
            comfort_rate: 4.0,
            safety_recovery_rate: 5.0,
            threat_safety_drain: 20.0,
            starvation_damage: 2.0,

            emotion_decay_rate: 0.1,
            memory_capacity: 50,
            enemy_affinity_threshold: -50.0,
            social_affinity_gain: 2.0,
            attack_affinity_penalty: 25.0,

            arrival_distance: 1.2,
            attack_cooldown: 1.0,
            flee_speed_multiplier: 1.4,
            predator_alarm_radius: 8.0,
            wander_radius: 6.0,
            explore_radius: 20.0,
            harvest_rate: 5.0,

            reproduction_chance: 0.02,
            reproduction_cooldown: 60.0,

            resource_regen_rate: 0.01,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if !(self.grid_cell_size > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "grid_cell_size must be positive, got {}",
                self.grid_cell_size
            )));
        }

        if !(self.perception_radius > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "perception_radius must be positive, got {}",
                self.perception_radius
            )));
        }

        if !(self.max_delta_seconds > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "max_delta_seconds must be positive, got {}",
                self.max_delta_seconds
            )));
        }

        if self.memory_capacity == 0 {
            return Err(SimError::InvalidConfig("memory_capacity must be at least 1".into()));
        }

        let rates = &self.need_rates;
        let all_rates = [
            rates.hunger,
            rates.thirst,
            rates.energy,
            rates.social,
            rates.comfort,
            rates.safety,
        ];
        if all_rates.iter().any(|r| *r < 0.0) || self.need_decay_multiplier < 0.0 {
            return Err(SimError::InvalidConfig("Need decay rates must be non-negative".into()));
        }

        if !(-100.0..0.0).contains(&self.enemy_affinity_threshold) {
            return Err(SimError::InvalidConfig(format!(
                "enemy_affinity_threshold ({}) must lie in [-100, 0)",
                self.enemy_affinity_threshold
            )));
        }

        Ok(())
    }
}
