//! Simulation configuration with documented constants
//!
//! All tunables are collected here with an explanation of what they drive.
//! Every field has a default so partial TOML files are valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

/// Configuration for the simulation systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === CLOCK ===
    /// Wall-clock length of one tick in milliseconds
    ///
    /// Attack cooldowns (`attack_speed_ms`) are measured against this:
    /// an entity with 2400ms attack speed swings every 4 ticks at 600ms.
    pub tick_interval_ms: u64,

    /// Seed for the combat RNG. Same seed + same inputs = same simulation.
    pub seed: u64,

    // === PATHFINDING ===
    /// Maximum A* node expansions per search
    ///
    /// Bounds the cost of searching for unreachable goals.
    pub max_path_expansions: usize,

    /// How many ticks a mover waits behind a lower-id mover before replanning
    pub max_yield_ticks: u32,

    // === LIFECYCLE ===
    /// Ticks a dead entity stays on the grid before it is removed
    ///
    /// Gives death-effect consumers a window to observe the corpse.
    pub death_grace_ticks: u64,

    // === COMBAT ===
    pub combat: CombatTuning,

    // === SPAWN DEFAULTS ===
    pub entity_defaults: EntityDefaults,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 600,
            seed: 0x5EED,
            max_path_expansions: 1000,
            max_yield_ticks: 2,
            death_grace_ticks: 3,
            combat: CombatTuning::default(),
            entity_defaults: EntityDefaults::default(),
        }
    }
}

/// Accuracy and damage formula constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Hit chance between equal-level opponents with no defense
    pub base_accuracy: f64,
    /// Hit chance gained per level of advantage
    pub level_factor: f64,
    /// Hit chance lost per point of target defense
    pub defense_factor: f64,
    pub min_hit_chance: f64,
    pub max_hit_chance: f64,
    /// Lower bound of the damage multiplier roll
    pub damage_variance_min: f64,
    /// Upper bound of the damage multiplier roll (inclusive)
    pub damage_variance_max: f64,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            base_accuracy: 0.7,
            level_factor: 0.002,
            defense_factor: 0.001,
            min_hit_chance: 0.05,
            max_hit_chance: 0.95,
            damage_variance_min: 0.8,
            damage_variance_max: 1.2,
        }
    }
}

/// Values substituted for missing or malformed entity attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDefaults {
    pub size: u32,
    pub level: i32,
    pub max_health: i32,
    pub damage: i32,
    pub defense: i32,
    pub attack_speed_ms: u64,
    pub tiles_per_tick: u32,
    pub aggro_range: u32,
}

impl Default for EntityDefaults {
    fn default() -> Self {
        Self {
            size: 1,
            level: 1,
            max_health: 100,
            damage: 10,
            defense: 0,
            attack_speed_ms: 2400,
            tiles_per_tick: 1,
            aggro_range: 8,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a config from a TOML string and validate it
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(SimError::InvalidConfig(
                "tick_interval_ms must be positive".into(),
            ));
        }

        if self.max_path_expansions == 0 {
            return Err(SimError::InvalidConfig(
                "max_path_expansions must be positive".into(),
            ));
        }

        let c = &self.combat;
        if !(0.0..=1.0).contains(&c.min_hit_chance)
            || !(0.0..=1.0).contains(&c.max_hit_chance)
            || c.min_hit_chance > c.max_hit_chance
        {
            return Err(SimError::InvalidConfig(format!(
                "hit chance bounds must satisfy 0 <= min ({}) <= max ({}) <= 1",
                c.min_hit_chance, c.max_hit_chance
            )));
        }

        if c.damage_variance_min < 0.0 || c.damage_variance_min > c.damage_variance_max {
            return Err(SimError::InvalidConfig(format!(
                "damage variance must satisfy 0 <= min ({}) <= max ({})",
                c.damage_variance_min, c.damage_variance_max
            )));
        }

        let d = &self.entity_defaults;
        if d.size == 0 || d.max_health <= 0 || d.attack_speed_ms == 0 {
            return Err(SimError::InvalidConfig(
                "entity defaults need size >= 1, max_health > 0 and attack_speed_ms > 0".into(),
            ));
        }

        Ok(())
    }
}
