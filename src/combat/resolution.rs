//! Melee attack resolution
//!
//! Attacks require melee adjacency (footprint distance <= 1) and the
//! attacker's `attack_speed_ms` to have elapsed since its previous swing.
//! Accuracy and damage use the formulas in `CombatTuning`; all randomness
//! comes from the RNG passed in by the scheduler.

use rand::Rng;

use crate::core::config::CombatTuning;
use crate::core::types::{EntityId, Tick};
use crate::ecs::world::SimWorld;
use crate::entity::CombatState;
use crate::simulation::clock::SimClock;
use crate::simulation::events::SimEvent;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttackResult {
    Hit {
        damage: i32,
        hit_chance: f64,
        killed: bool,
    },
    Miss {
        hit_chance: f64,
    },
    OnCooldown,
    OutOfRange,
    NoTarget,
}

/// Chance to hit, clamped into `[min_hit_chance, max_hit_chance]`
pub fn hit_chance(
    attacker_level: i32,
    target_level: i32,
    target_defense: i32,
    tuning: &CombatTuning,
) -> f64 {
    let level_diff = attacker_level as f64 - target_level as f64;
    let raw = tuning.base_accuracy + level_diff * tuning.level_factor
        - target_defense as f64 * tuning.defense_factor;
    raw.max(tuning.min_hit_chance).min(tuning.max_hit_chance)
}

/// `floor(base * uniform(min..=max))`, never negative
pub fn roll_damage<R: Rng>(base: i32, rng: &mut R, tuning: &CombatTuning) -> i32 {
    if base <= 0 {
        return 0;
    }
    let multiplier = if tuning.damage_variance_min < tuning.damage_variance_max {
        rng.gen_range(tuning.damage_variance_min..=tuning.damage_variance_max)
    } else {
        tuning.damage_variance_min
    };
    ((base as f64 * multiplier).floor() as i32).max(0)
}

/// Put an entity into its terminal state and detach everyone targeting it.
/// Publishes exactly one `EntityDeath`; repeated calls are no-ops.
pub fn apply_death(world: &mut SimWorld, deceased: EntityId, killer: Option<EntityId>, now: Tick) {
    let Some(entity) = world.entity_mut(deceased) else {
        return;
    };
    if entity.is_dead() {
        return;
    }
    entity.mark_dead(now);
    let name = entity.display_name();

    for id in world.entity_ids() {
        if let Some(other) = world.entity_mut(id) {
            if other.target == Some(deceased) {
                other.clear_target();
            }
        }
    }

    match killer {
        Some(killer) => tracing::info!("{} was killed by {}", name, killer),
        None => tracing::info!("{} died", name),
    }
    world.publish(SimEvent::EntityDeath { deceased, killer });
}

/// One swing from `attacker` at its current target
pub fn attempt_attack<R: Rng>(
    world: &mut SimWorld,
    attacker_id: EntityId,
    clock: &SimClock,
    rng: &mut R,
    tuning: &CombatTuning,
) -> AttackResult {
    let Some(attacker) = world.entity(attacker_id).filter(|a| a.is_alive()) else {
        return AttackResult::NoTarget;
    };
    let Some(target) = attacker
        .target
        .and_then(|t| world.entity(t))
        .filter(|t| t.is_alive())
    else {
        return AttackResult::NoTarget;
    };
    if !attacker.in_melee_range(target) {
        return AttackResult::OutOfRange;
    }
    if let Some(last) = attacker.last_attack_tick {
        if clock.elapsed_ms_since(last) < attacker.stats.attack_speed_ms {
            return AttackResult::OnCooldown;
        }
    }

    let target_id = target.id;
    let chance = hit_chance(
        attacker.stats.level,
        target.stats.level,
        target.stats.defense,
        tuning,
    );
    let base_damage = attacker.stats.damage;

    if let Some(attacker) = world.entity_mut(attacker_id) {
        attacker.last_attack_tick = Some(clock.tick);
    }

    if rng.gen::<f64>() >= chance {
        tracing::debug!("{} missed {} ({:.2})", attacker_id, target_id, chance);
        world.publish(SimEvent::CombatMiss {
            attacker: attacker_id,
            target: target_id,
            hit_chance: chance,
        });
        return AttackResult::Miss { hit_chance: chance };
    }

    let damage = roll_damage(base_damage, rng, tuning);
    let killed = match world.entity_mut(target_id) {
        Some(target) => {
            target.stats.apply_damage(damage);
            !target.stats.is_alive()
        }
        None => false,
    };
    tracing::debug!("{} hit {} for {}", attacker_id, target_id, damage);
    world.publish(SimEvent::CombatHit {
        attacker: attacker_id,
        target: target_id,
        damage,
        hit_chance: chance,
    });

    if killed {
        apply_death(world, target_id, Some(attacker_id), clock.tick);
    }

    AttackResult::Hit {
        damage,
        hit_chance: chance,
        killed,
    }
}

/// Combat pass over every attacking entity in registration order
///
/// State is re-read per entity: an attacker whose target died earlier in
/// this pass has already been reset to idle and is skipped.
pub fn run_combat_pass<R: Rng>(
    world: &mut SimWorld,
    clock: &SimClock,
    rng: &mut R,
    tuning: &CombatTuning,
) -> Vec<(EntityId, AttackResult)> {
    let mut results = Vec::new();
    for id in world.entity_ids() {
        let attacking = world
            .entity(id)
            .map_or(false, |e| e.state == CombatState::Attacking);
        if attacking {
            results.push((id, attempt_attack(world, id, clock, rng, tuning)));
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::entity::EntityAttributes;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn duel(attacker: EntityAttributes, target: EntityAttributes) -> SimWorld {
        let config = SimulationConfig::default();
        let mut world = SimWorld::new(10, 10);
        world.add_entity(EntityId(1), &attacker, &config).unwrap();
        world.add_entity(EntityId(2), &target, &config).unwrap();
        let a = world.entity_mut(EntityId(1)).unwrap();
        a.target = Some(EntityId(2));
        a.state = CombatState::Attacking;
        world.events_mut().drain_log();
        world
    }

    fn always_hit() -> CombatTuning {
        CombatTuning {
            min_hit_chance: 1.0,
            max_hit_chance: 1.0,
            ..CombatTuning::default()
        }
    }

    fn clock(tick: u64) -> SimClock {
        SimClock {
            tick,
            interval_ms: 600,
        }
    }

    #[test]
    fn test_hit_chance_formula() {
        let tuning = CombatTuning::default();
        assert!((hit_chance(1, 1, 0, &tuning) - 0.7).abs() < 1e-9);
        assert!((hit_chance(51, 1, 100, &tuning) - 0.7).abs() < 1e-9);
        assert!((hit_chance(11, 1, 0, &tuning) - 0.72).abs() < 1e-9);
    }

    #[test]
    fn test_hit_chance_clamped_at_extremes() {
        let tuning = CombatTuning::default();
        assert_eq!(hit_chance(1001, 1, 0, &tuning), 0.95);
        assert_eq!(hit_chance(1, 1001, 0, &tuning), 0.05);
        assert_eq!(hit_chance(1, 1, 100_000, &tuning), 0.05);
        assert_eq!(hit_chance(i32::MAX, i32::MIN, i32::MIN, &tuning), 0.95);
    }

    #[test]
    fn test_damage_within_variance() {
        let tuning = CombatTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1000 {
            let dmg = roll_damage(10, &mut rng, &tuning);
            assert!((8..=12).contains(&dmg), "damage {} out of range", dmg);
        }
        assert_eq!(roll_damage(0, &mut rng, &tuning), 0);
        assert_eq!(roll_damage(-5, &mut rng, &tuning), 0);
    }

    #[test]
    fn test_attack_out_of_range() {
        let mut world = duel(EntityAttributes::at(0, 0), EntityAttributes::at(5, 5));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            attempt_attack(&mut world, EntityId(1), &clock(0), &mut rng, &always_hit()),
            AttackResult::OutOfRange
        );
    }

    #[test]
    fn test_attack_cooldown() {
        // 2400ms attack speed at 600ms ticks: one swing every 4 ticks
        let mut world = duel(EntityAttributes::at(0, 0), EntityAttributes::at(1, 0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tuning = always_hit();

        assert!(matches!(
            attempt_attack(&mut world, EntityId(1), &clock(0), &mut rng, &tuning),
            AttackResult::Hit { .. }
        ));
        for tick in 1..4 {
            assert_eq!(
                attempt_attack(&mut world, EntityId(1), &clock(tick), &mut rng, &tuning),
                AttackResult::OnCooldown
            );
        }
        assert!(matches!(
            attempt_attack(&mut world, EntityId(1), &clock(4), &mut rng, &tuning),
            AttackResult::Hit { .. }
        ));
    }

    #[test]
    fn test_miss_publishes_event() {
        let mut world = duel(EntityAttributes::at(0, 0), EntityAttributes::at(1, 0));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let never = CombatTuning {
            min_hit_chance: 0.0,
            max_hit_chance: 0.0,
            ..CombatTuning::default()
        };

        assert_eq!(
            attempt_attack(&mut world, EntityId(1), &clock(0), &mut rng, &never),
            AttackResult::Miss { hit_chance: 0.0 }
        );
        assert_eq!(
            world.events_mut().drain_log(),
            vec![SimEvent::CombatMiss {
                attacker: EntityId(1),
                target: EntityId(2),
                hit_chance: 0.0
            }]
        );
        assert_eq!(world.entity(EntityId(2)).unwrap().stats.health, 100);
    }

    #[test]
    fn test_lethal_hit_kills_once() {
        let mut world = duel(
            EntityAttributes::at(0, 0).with_damage(50),
            EntityAttributes::at(1, 0).with_health(5),
        );
        let config = SimulationConfig::default();
        world.add_entity(EntityId(3), &EntityAttributes::at(2, 0), &config).unwrap();
        world.entity_mut(EntityId(3)).unwrap().target = Some(EntityId(2));
        world.entity_mut(EntityId(3)).unwrap().state = CombatState::Attacking;
        world.events_mut().drain_log();

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let results = run_combat_pass(&mut world, &clock(0), &mut rng, &always_hit());

        // #3 was reset to idle by the death before its turn came
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].1, AttackResult::Hit { killed: true, .. }));

        let dead = world.entity(EntityId(2)).unwrap();
        assert_eq!(dead.state, CombatState::Dead);
        assert_eq!(dead.stats.health, 0);
        assert_eq!(world.entity(EntityId(1)).unwrap().target, None);
        assert_eq!(world.entity(EntityId(3)).unwrap().state, CombatState::Idle);

        let deaths = world
            .events_mut()
            .drain_log()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::EntityDeath { .. }))
            .count();
        assert_eq!(deaths, 1);

        // Corpse stays placed until reaped
        assert!(world.occupancy().contains_entity(EntityId(2)));
        apply_death(&mut world, EntityId(2), None, 1);
        assert!(world.events_mut().drain_log().is_empty());
    }
}
