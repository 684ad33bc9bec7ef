//! Combat stats and the per-entity combat state machine

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// idle -> moving -> attacking -> idle, with `Dead` terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatState {
    #[default]
    #[display(fmt = "idle")]
    Idle,
    #[display(fmt = "moving")]
    Moving,
    #[display(fmt = "attacking")]
    Attacking,
    #[display(fmt = "dead")]
    Dead,
}

impl CombatState {
    pub fn is_dead(&self) -> bool {
        matches!(self, CombatState::Dead)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub level: i32,
    pub health: i32,
    pub max_health: i32,
    pub damage: i32,
    pub defense: i32,
    /// Minimum time between two swings
    pub attack_speed_ms: u64,
}

impl CombatStats {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Subtract damage, flooring health at 0. Returns the damage absorbed.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let before = self.health;
        self.health = (self.health - amount.max(0)).max(0);
        before - self.health
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }
}
