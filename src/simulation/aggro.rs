//! Target acquisition for aggressive entities
//!
//! A target is valid while it is alive, hostile, within `aggro_range`
//! (footprint distance) and visible anchor to anchor. A valid current
//! target is kept; otherwise the nearest valid candidate wins, ties going
//! to the lower id.

use crate::core::types::EntityId;
use crate::ecs::world::SimWorld;
use crate::entity::{CombatState, Entity};
use crate::spatial::line_of_sight::has_line_of_sight;

/// A target switch made during the aggro pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetChange {
    pub entity: EntityId,
    pub previous: Option<EntityId>,
    pub current: Option<EntityId>,
}

pub fn is_valid_target(world: &SimWorld, seeker: &Entity, candidate: &Entity) -> bool {
    candidate.is_alive()
        && seeker.is_hostile_to(candidate)
        && seeker.distance_to(candidate) <= seeker.aggro_range
        && has_line_of_sight(world.grid(), seeker.position, candidate.position)
}

/// Target the seeker should have this tick, if any
pub fn select_target(world: &SimWorld, seeker: &Entity) -> Option<EntityId> {
    if let Some(current) = seeker.target.and_then(|t| world.entity(t)) {
        if is_valid_target(world, seeker, current) {
            return Some(current.id);
        }
    }

    world
        .entities()
        .filter(|candidate| is_valid_target(world, seeker, candidate))
        .min_by_key(|candidate| (seeker.distance_to(candidate), candidate.id))
        .map(|candidate| candidate.id)
}

/// Re-evaluate one entity's target and combat state
pub fn update_aggro(world: &mut SimWorld, id: EntityId) -> Option<TargetChange> {
    let seeker = world.entity(id)?;
    if !seeker.aggressive || !seeker.is_alive() {
        return None;
    }

    let previous = seeker.target;
    let selected = select_target(world, seeker);
    let in_melee = selected
        .and_then(|t| world.entity(t))
        .map(|target| seeker.in_melee_range(target));

    let entity = world.entity_mut(id)?;
    match (selected, in_melee) {
        (Some(target), Some(in_melee)) => {
            if previous != Some(target) {
                entity.path.clear();
                entity.path_stale = false;
                entity.blocked_ticks = 0;
                entity.target = Some(target);
            }
            entity.state = if in_melee {
                CombatState::Attacking
            } else {
                CombatState::Moving
            };
        }
        _ => {
            if previous.is_some() || entity.state != CombatState::Idle {
                entity.clear_target();
            }
        }
    }

    if previous == selected {
        return None;
    }
    match (previous, selected) {
        (_, Some(target)) => tracing::debug!("{} targets {}", id, target),
        (Some(lost), None) => tracing::debug!("{} lost target {}", id, lost),
        (None, None) => {}
    }
    Some(TargetChange {
        entity: id,
        previous,
        current: selected,
    })
}

/// Aggro pass over every entity in registration order
pub fn run_aggro_pass(world: &mut SimWorld) -> Vec<TargetChange> {
    world
        .entity_ids()
        .into_iter()
        .filter_map(|id| update_aggro(world, id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::TileCoord;
    use crate::entity::EntityAttributes;

    fn world_with(entities: &[(u32, EntityAttributes)]) -> SimWorld {
        let config = SimulationConfig::default();
        let mut world = SimWorld::new(30, 30);
        for (id, attrs) in entities {
            world.add_entity(EntityId(*id), attrs, &config).unwrap();
        }
        world
    }

    #[test]
    fn test_idle_to_moving_within_one_pass() {
        let mut world = world_with(&[
            (1, EntityAttributes::at(5, 5).aggressive(6)),
            (2, EntityAttributes::at(10, 5)),
        ]);

        let changes = run_aggro_pass(&mut world);

        assert_eq!(changes.len(), 1);
        let e = world.entity(EntityId(1)).unwrap();
        assert_eq!(e.target, Some(EntityId(2)));
        assert_eq!(e.state, CombatState::Moving);
        // Passive entities never acquire targets
        assert_eq!(world.entity(EntityId(2)).unwrap().target, None);
    }

    #[test]
    fn test_adjacent_target_means_attacking() {
        let mut world = world_with(&[
            (1, EntityAttributes::at(5, 5).aggressive(6)),
            (2, EntityAttributes::at(6, 6)),
        ]);
        run_aggro_pass(&mut world);
        assert_eq!(world.entity(EntityId(1)).unwrap().state, CombatState::Attacking);
    }

    #[test]
    fn test_losing_sight_returns_to_idle() {
        let mut world = world_with(&[
            (1, EntityAttributes::at(5, 5).aggressive(8)),
            (2, EntityAttributes::at(10, 5)),
        ]);
        run_aggro_pass(&mut world);
        assert_eq!(world.entity(EntityId(1)).unwrap().state, CombatState::Moving);

        world.set_walkable(TileCoord::new(7, 5), false).unwrap();
        run_aggro_pass(&mut world);

        let e = world.entity(EntityId(1)).unwrap();
        assert_eq!(e.state, CombatState::Idle);
        assert_eq!(e.target, None);
    }

    #[test]
    fn test_losing_range_returns_to_idle() {
        let mut world = world_with(&[
            (1, EntityAttributes::at(5, 5).aggressive(6)),
            (2, EntityAttributes::at(10, 5)),
        ]);
        run_aggro_pass(&mut world);
        assert_eq!(world.entity(EntityId(1)).unwrap().target, Some(EntityId(2)));

        world.relocate_entity(EntityId(2), TileCoord::new(20, 5)).unwrap();
        let changes = run_aggro_pass(&mut world);

        assert_eq!(changes.len(), 1);
        let e = world.entity(EntityId(1)).unwrap();
        assert_eq!(e.state, CombatState::Idle);
        assert_eq!(e.target, None);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let mut world = world_with(&[
            (1, EntityAttributes::at(0, 0).aggressive(3)),
            (2, EntityAttributes::at(10, 10)),
        ]);
        assert!(run_aggro_pass(&mut world).is_empty());
        assert_eq!(world.entity(EntityId(1)).unwrap().state, CombatState::Idle);
    }

    #[test]
    fn test_nearest_then_lowest_id() {
        let mut world = world_with(&[
            (1, EntityAttributes::at(10, 10).aggressive(8)),
            (5, EntityAttributes::at(13, 10)),
            (3, EntityAttributes::at(10, 13)),
            (4, EntityAttributes::at(16, 10)),
        ]);
        run_aggro_pass(&mut world);
        assert_eq!(world.entity(EntityId(1)).unwrap().target, Some(EntityId(3)));
    }

    #[test]
    fn test_target_is_sticky() {
        let mut world = world_with(&[
            (1, EntityAttributes::at(10, 10).aggressive(8)),
            (2, EntityAttributes::at(15, 10)),
        ]);
        run_aggro_pass(&mut world);

        let config = SimulationConfig::default();
        world
            .add_entity(EntityId(3), &EntityAttributes::at(12, 10), &config)
            .unwrap();
        assert!(run_aggro_pass(&mut world).is_empty());
        assert_eq!(world.entity(EntityId(1)).unwrap().target, Some(EntityId(2)));
    }

    #[test]
    fn test_same_faction_is_ignored() {
        let mut world = world_with(&[
            (1, EntityAttributes::at(5, 5).aggressive(8).with_faction(1)),
            (2, EntityAttributes::at(7, 5).with_faction(1)),
            (3, EntityAttributes::at(9, 5).with_faction(2)),
        ]);
        run_aggro_pass(&mut world);
        assert_eq!(world.entity(EntityId(1)).unwrap().target, Some(EntityId(3)));
    }

    #[test]
    fn test_dead_candidates_are_skipped() {
        let mut world = world_with(&[
            (1, EntityAttributes::at(5, 5).aggressive(8)),
            (2, EntityAttributes::at(7, 5)),
        ]);
        world.entity_mut(EntityId(2)).unwrap().mark_dead(0);
        assert!(run_aggro_pass(&mut world).is_empty());
        assert_eq!(world.entity(EntityId(1)).unwrap().target, None);
    }
}
