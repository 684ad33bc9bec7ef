//! Entity attribute records and the single place where defaults are applied
//!
//! Attributes arrive from spawn calls and scenario files with any subset of
//! fields set. `resolve` turns them into concrete values, substituting
//! `EntityDefaults` for anything missing or malformed and listing what it
//! had to fix.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::EntityDefaults;
use crate::core::types::{TileCoord, MAX_FOOTPRINT_SIZE};

/// Spawn-time description of an entity; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityAttributes {
    pub name: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub size: Option<u32>,
    pub level: Option<i32>,
    pub health: Option<i32>,
    pub max_health: Option<i32>,
    pub damage: Option<i32>,
    pub defense: Option<i32>,
    pub attack_speed_ms: Option<i64>,
    pub tiles_per_tick: Option<u32>,
    pub aggro_range: Option<u32>,
    pub aggressive: Option<bool>,
    pub faction: Option<u32>,
}

/// A malformed attribute that was replaced by a default
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeIssue {
    #[error("no position given, placing at (0, 0)")]
    MissingPosition,

    #[error("footprint size 0 replaced by {0}")]
    ZeroSize(u32),

    #[error("footprint size {given} exceeds {max}, using {used}")]
    OversizedFootprint { given: u32, max: u32, used: u32 },

    #[error("max health {given} is not positive, using {used}")]
    NonPositiveMaxHealth { given: i32, used: i32 },

    #[error("health {given} is not positive, using {used}")]
    NonPositiveHealth { given: i32, used: i32 },

    #[error("health {given} exceeds max health {max}, clamped")]
    HealthAboveMax { given: i32, max: i32 },

    #[error("attack speed {given}ms is not positive, using {used}ms")]
    NonPositiveAttackSpeed { given: i64, used: u64 },

    #[error("damage {given} is negative, using {used}")]
    NegativeDamage { given: i32, used: i32 },

    #[error("tiles per tick 0 replaced by {0}")]
    ZeroTilesPerTick(u32),
}

/// Concrete values after defaulting
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttributes {
    pub name: Option<String>,
    pub position: TileCoord,
    pub size: u32,
    pub level: i32,
    pub health: i32,
    pub max_health: i32,
    pub damage: i32,
    pub defense: i32,
    pub attack_speed_ms: u64,
    pub tiles_per_tick: u32,
    pub aggro_range: u32,
    pub aggressive: bool,
    pub faction: Option<u32>,
}

impl EntityAttributes {
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn aggressive(mut self, aggro_range: u32) -> Self {
        self.aggressive = Some(true);
        self.aggro_range = Some(aggro_range);
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = Some(health);
        self.max_health = Some(health);
        self
    }

    pub fn with_damage(mut self, damage: i32) -> Self {
        self.damage = Some(damage);
        self
    }

    pub fn with_faction(mut self, faction: u32) -> Self {
        self.faction = Some(faction);
        self
    }

    /// Apply defaults. Never fails; problems are returned alongside.
    pub fn resolve(&self, defaults: &EntityDefaults) -> (ResolvedAttributes, Vec<AttributeIssue>) {
        let mut issues = Vec::new();

        let position = match (self.x, self.y) {
            (Some(x), Some(y)) => TileCoord::new(x, y),
            _ => {
                issues.push(AttributeIssue::MissingPosition);
                TileCoord::new(self.x.unwrap_or(0), self.y.unwrap_or(0))
            }
        };

        let default_size = defaults.size.clamp(1, MAX_FOOTPRINT_SIZE);
        let size = match self.size {
            Some(0) => {
                issues.push(AttributeIssue::ZeroSize(default_size));
                default_size
            }
            Some(given) if given > MAX_FOOTPRINT_SIZE => {
                issues.push(AttributeIssue::OversizedFootprint {
                    given,
                    max: MAX_FOOTPRINT_SIZE,
                    used: default_size,
                });
                default_size
            }
            Some(size) => size,
            None => default_size,
        };

        let max_health = match self.max_health {
            Some(given) if given <= 0 => {
                issues.push(AttributeIssue::NonPositiveMaxHealth {
                    given,
                    used: defaults.max_health,
                });
                defaults.max_health
            }
            Some(given) => given,
            None => match self.health {
                Some(h) if h > 0 => h.max(defaults.max_health),
                _ => defaults.max_health,
            },
        };

        let health = match self.health {
            Some(given) if given <= 0 => {
                issues.push(AttributeIssue::NonPositiveHealth {
                    given,
                    used: max_health,
                });
                max_health
            }
            Some(given) if given > max_health => {
                issues.push(AttributeIssue::HealthAboveMax {
                    given,
                    max: max_health,
                });
                max_health
            }
            Some(given) => given,
            None => max_health,
        };

        let attack_speed_ms = match self.attack_speed_ms {
            Some(given) if given <= 0 => {
                issues.push(AttributeIssue::NonPositiveAttackSpeed {
                    given,
                    used: defaults.attack_speed_ms,
                });
                defaults.attack_speed_ms
            }
            Some(given) => given as u64,
            None => defaults.attack_speed_ms,
        };

        let damage = match self.damage {
            Some(given) if given < 0 => {
                issues.push(AttributeIssue::NegativeDamage {
                    given,
                    used: defaults.damage,
                });
                defaults.damage
            }
            Some(given) => given,
            None => defaults.damage,
        };

        let tiles_per_tick = match self.tiles_per_tick {
            Some(0) => {
                issues.push(AttributeIssue::ZeroTilesPerTick(defaults.tiles_per_tick.max(1)));
                defaults.tiles_per_tick.max(1)
            }
            Some(n) => n,
            None => defaults.tiles_per_tick.max(1),
        };

        let resolved = ResolvedAttributes {
            name: self.name.clone(),
            position,
            size,
            level: self.level.unwrap_or(defaults.level),
            health,
            max_health,
            damage,
            defense: self.defense.unwrap_or(defaults.defense),
            attack_speed_ms,
            tiles_per_tick,
            aggro_range: self.aggro_range.unwrap_or(defaults.aggro_range),
            aggressive: self.aggressive.unwrap_or(false),
            faction: self.faction,
        };

        (resolved, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let defaults = EntityDefaults::default();
        let (resolved, issues) = EntityAttributes::at(3, 4).resolve(&defaults);

        assert!(issues.is_empty());
        assert_eq!(resolved.position, TileCoord::new(3, 4));
        assert_eq!(resolved.size, defaults.size);
        assert_eq!(resolved.health, defaults.max_health);
        assert_eq!(resolved.attack_speed_ms, defaults.attack_speed_ms);
        assert!(!resolved.aggressive);
    }

    #[test]
    fn test_negative_health_and_zero_attack_speed() {
        let defaults = EntityDefaults::default();
        let attrs = EntityAttributes {
            health: Some(-5),
            attack_speed_ms: Some(0),
            ..EntityAttributes::at(0, 0)
        };

        let (resolved, issues) = attrs.resolve(&defaults);

        assert_eq!(resolved.health, defaults.max_health);
        assert_eq!(resolved.attack_speed_ms, defaults.attack_speed_ms);
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], AttributeIssue::NonPositiveHealth { given: -5, .. }));
        assert!(matches!(
            issues[1],
            AttributeIssue::NonPositiveAttackSpeed { given: 0, .. }
        ));
    }

    #[test]
    fn test_health_clamped_to_max() {
        let attrs = EntityAttributes {
            health: Some(500),
            max_health: Some(200),
            ..EntityAttributes::at(0, 0)
        };
        let (resolved, issues) = attrs.resolve(&EntityDefaults::default());
        assert_eq!(resolved.health, 200);
        assert_eq!(
            issues,
            vec![AttributeIssue::HealthAboveMax {
                given: 500,
                max: 200
            }]
        );
    }

    #[test]
    fn test_health_without_max_raises_max() {
        let attrs = EntityAttributes {
            health: Some(250),
            ..EntityAttributes::at(0, 0)
        };
        let (resolved, issues) = attrs.resolve(&EntityDefaults::default());
        assert!(issues.is_empty());
        assert_eq!(resolved.health, 250);
        assert_eq!(resolved.max_health, 250);
    }

    #[test]
    fn test_zero_size_and_missing_position() {
        let attrs = EntityAttributes {
            size: Some(0),
            ..Default::default()
        };
        let (resolved, issues) = attrs.resolve(&EntityDefaults::default());
        assert_eq!(resolved.size, 1);
        assert_eq!(resolved.position, TileCoord::new(0, 0));
        assert!(issues.contains(&AttributeIssue::MissingPosition));
        assert!(issues.contains(&AttributeIssue::ZeroSize(1)));
    }

    #[test]
    fn test_oversized_footprint_takes_default() {
        let defaults = EntityDefaults::default();
        for given in [3_000_000_000, 1 << 31, MAX_FOOTPRINT_SIZE + 1] {
            let (resolved, issues) = EntityAttributes::at(2, 2)
                .with_size(given)
                .resolve(&defaults);
            assert_eq!(resolved.size, defaults.size);
            assert_eq!(
                issues,
                vec![AttributeIssue::OversizedFootprint {
                    given,
                    max: MAX_FOOTPRINT_SIZE,
                    used: defaults.size,
                }]
            );
        }

        let (resolved, issues) = EntityAttributes::at(0, 0)
            .with_size(MAX_FOOTPRINT_SIZE)
            .resolve(&defaults);
        assert_eq!(resolved.size, MAX_FOOTPRINT_SIZE);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_parse_from_toml() {
        let attrs: EntityAttributes = toml::from_str(
            r#"
            name = "raider"
            x = 25
            y = 25
            aggressive = true
            aggro_range = 10
            "#,
        )
        .unwrap();
        assert_eq!(attrs.name.as_deref(), Some("raider"));
        assert_eq!(attrs.aggro_range, Some(10));
        assert_eq!(attrs.size, None);
    }
}
