//! Simulated entities
//!
//! An `Entity` is a fixed record: position and footprint, combat stats,
//! movement and targeting state. All defaulting happens in
//! `Entity::from_attributes`.

pub mod attributes;
pub mod combatant;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::config::EntityDefaults;
use crate::core::types::{EntityId, Footprint, Tick, TileCoord};

pub use attributes::{AttributeIssue, EntityAttributes, ResolvedAttributes};
pub use combatant::{CombatState, CombatStats};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: Option<String>,
    /// Top-left anchor of the footprint
    pub position: TileCoord,
    pub size: u32,
    pub stats: CombatStats,
    pub tiles_per_tick: u32,
    pub aggro_range: u32,
    pub aggressive: bool,
    /// Entities sharing a faction never target each other
    pub faction: Option<u32>,

    pub target: Option<EntityId>,
    /// Remaining anchors to visit, next step first
    pub path: VecDeque<TileCoord>,
    /// Set when a step failed; forces a replan on the next movement pass
    pub path_stale: bool,
    /// Consecutive ticks spent yielding to a lower-id mover
    pub blocked_ticks: u32,
    pub state: CombatState,

    pub last_move_tick: Option<Tick>,
    pub last_attack_tick: Option<Tick>,
    pub died_at: Option<Tick>,
}

impl Entity {
    /// Build an entity from partial attributes, warning about anything
    /// that had to be replaced
    pub fn from_attributes(
        id: EntityId,
        attributes: &EntityAttributes,
        defaults: &EntityDefaults,
    ) -> Self {
        let (entity, issues) = Self::resolve(id, attributes, defaults);
        for issue in &issues {
            tracing::warn!("{}: invalid attribute, {}", id, issue);
        }
        entity
    }

    /// Like `from_attributes` but hands the issues back instead of logging
    pub fn resolve(
        id: EntityId,
        attributes: &EntityAttributes,
        defaults: &EntityDefaults,
    ) -> (Self, Vec<AttributeIssue>) {
        let (r, issues) = attributes.resolve(defaults);
        let entity = Self {
            id,
            name: r.name,
            position: r.position,
            size: r.size,
            stats: CombatStats {
                level: r.level,
                health: r.health,
                max_health: r.max_health,
                damage: r.damage,
                defense: r.defense,
                attack_speed_ms: r.attack_speed_ms,
            },
            tiles_per_tick: r.tiles_per_tick,
            aggro_range: r.aggro_range,
            aggressive: r.aggressive,
            faction: r.faction,
            target: None,
            path: VecDeque::new(),
            path_stale: false,
            blocked_ticks: 0,
            state: CombatState::Idle,
            last_move_tick: None,
            last_attack_tick: None,
            died_at: None,
        };
        (entity, issues)
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.position, self.size)
    }

    /// Alive and interactive; corpses in their grace period are not
    pub fn is_alive(&self) -> bool {
        !self.state.is_dead() && self.stats.is_alive()
    }

    pub fn is_dead(&self) -> bool {
        self.state.is_dead()
    }

    /// Footprint-aware Chebyshev gap; 1 means touching
    pub fn distance_to(&self, other: &Entity) -> u32 {
        self.footprint().distance_to(&other.footprint())
    }

    pub fn in_melee_range(&self, other: &Entity) -> bool {
        self.distance_to(other) <= 1
    }

    pub fn is_hostile_to(&self, other: &Entity) -> bool {
        if self.id == other.id {
            return false;
        }
        match (self.faction, other.faction) {
            (Some(a), Some(b)) => a != b,
            _ => true,
        }
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} {}", name, self.id),
            None => self.id.to_string(),
        }
    }

    /// Drop target and path; living entities go back to idle
    pub fn clear_target(&mut self) {
        self.target = None;
        self.path.clear();
        self.path_stale = false;
        self.blocked_ticks = 0;
        if !self.is_dead() {
            self.state = CombatState::Idle;
        }
    }

    /// Enter the terminal state; the corpse stays placed until reaped
    pub fn mark_dead(&mut self, now: Tick) {
        self.clear_target();
        self.state = CombatState::Dead;
        self.died_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(id: u32, x: i32, y: i32) -> Entity {
        Entity::from_attributes(
            EntityId(id),
            &EntityAttributes::at(x, y),
            &EntityDefaults::default(),
        )
    }

    #[test]
    fn test_from_attributes_builds_idle_entity() {
        let e = spawn(1, 4, 5);
        assert_eq!(e.position, TileCoord::new(4, 5));
        assert_eq!(e.state, CombatState::Idle);
        assert!(e.path.is_empty());
        assert!(e.target.is_none());
        assert!(e.is_alive());
    }

    #[test]
    fn test_melee_range_is_footprint_aware() {
        let mut big = spawn(1, 0, 0);
        big.size = 3;
        let other = spawn(2, 3, 1);
        assert_eq!(big.distance_to(&other), 1);
        assert!(big.in_melee_range(&other));

        let far = spawn(3, 5, 0);
        assert!(!big.in_melee_range(&far));
    }

    #[test]
    fn test_factions() {
        let mut a = spawn(1, 0, 0);
        let mut b = spawn(2, 1, 0);
        assert!(a.is_hostile_to(&b));

        a.faction = Some(7);
        b.faction = Some(7);
        assert!(!a.is_hostile_to(&b));

        b.faction = None;
        assert!(a.is_hostile_to(&b));
        assert!(!a.is_hostile_to(&a.clone()));
    }

    #[test]
    fn test_mark_dead_is_terminal() {
        let mut e = spawn(1, 0, 0);
        e.target = Some(EntityId(2));
        e.state = CombatState::Attacking;

        e.mark_dead(12);
        assert_eq!(e.state, CombatState::Dead);
        assert_eq!(e.died_at, Some(12));
        assert!(e.target.is_none());

        e.clear_target();
        assert_eq!(e.state, CombatState::Dead);
    }
}
