//! Movement executor
//!
//! Moving entities walk their cached path toward melee adjacency with their
//! target, at most `tiles_per_tick` steps and at most once per tick. Each
//! step is clear-then-place on the occupancy index.
//!
//! Blocked steps: a mover blocked by a lower-id entity that is itself
//! moving waits (keeping its path) for up to `max_yield_ticks` ticks; any
//! other blocker triggers an immediate replan. Lower ids always have right
//! of way, so two movers can never invalidate each other forever.

use crate::core::config::SimulationConfig;
use crate::core::error::PlacementFailure;
use crate::core::types::{EntityId, Footprint};
use crate::ecs::world::SimWorld;
use crate::entity::CombatState;
use crate::simulation::clock::SimClock;
use crate::simulation::events::SimEvent;
use crate::spatial::pathfinding::{find_path_to_adjacent, PathRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Took this many steps
    Moved(u32),
    /// Already adjacent to the target; switched to attacking
    Arrived,
    /// Waiting behind a lower-id mover
    Yielded,
    /// Step failed even after replanning; retried next tick
    Blocked,
    /// No route to the target within the search budget
    NoPath,
    /// Not moving, dead, or already moved this tick
    Skipped,
}

/// Recompute the path to melee adjacency with `target`
fn replan(world: &mut SimWorld, id: EntityId, target: Footprint, config: &SimulationConfig) {
    let Some(entity) = world.entity(id) else {
        return;
    };
    let request = PathRequest::new(entity.position, entity.size)
        .for_entity(id)
        .with_budget(config.max_path_expansions);
    let path = find_path_to_adjacent(world.grid(), world.occupancy(), request, target);

    if path.is_empty() {
        tracing::debug!("{} has no path to {}", id, target.origin);
    } else {
        tracing::trace!("{} planned {} steps toward {}", id, path.len(), target.origin);
    }

    if let Some(entity) = world.entity_mut(id) {
        entity.path = path.into();
        entity.path_stale = false;
    }
}

fn should_yield(
    world: &SimWorld,
    mover: EntityId,
    blocker: EntityId,
    blocked_ticks: u32,
    config: &SimulationConfig,
) -> bool {
    blocker < mover
        && blocked_ticks < config.max_yield_ticks
        && world
            .entity(blocker)
            .map_or(false, |b| b.is_alive() && b.state == CombatState::Moving)
}

/// Advance one entity along its path
pub fn advance_entity(
    world: &mut SimWorld,
    id: EntityId,
    clock: &SimClock,
    config: &SimulationConfig,
) -> MoveOutcome {
    let Some(entity) = world.entity(id) else {
        return MoveOutcome::Skipped;
    };
    if !entity.is_alive()
        || entity.state != CombatState::Moving
        || entity.last_move_tick == Some(clock.tick)
    {
        return MoveOutcome::Skipped;
    }

    let Some(target) = entity
        .target
        .and_then(|t| world.entity(t))
        .filter(|t| t.is_alive())
        .map(|t| t.footprint())
    else {
        if let Some(entity) = world.entity_mut(id) {
            entity.clear_target();
        }
        return MoveOutcome::Skipped;
    };

    let size = entity.size;
    let tiles_per_tick = entity.tiles_per_tick;

    if entity.footprint().distance_to(&target) <= 1 {
        if let Some(entity) = world.entity_mut(id) {
            entity.path.clear();
            entity.state = CombatState::Attacking;
        }
        return MoveOutcome::Arrived;
    }

    let ends_adjacent = entity
        .path
        .back()
        .map_or(false, |&end| Footprint::new(end, size).distance_to(&target) == 1);
    let mut replanned = false;
    if entity.path.is_empty() || entity.path_stale || !ends_adjacent {
        replan(world, id, target, config);
        replanned = true;
    }

    let mut steps = 0u32;
    let mut halted = None;

    while steps < tiles_per_tick {
        let Some(entity) = world.entity(id) else {
            break;
        };
        let Some(&next) = entity.path.front() else {
            break;
        };
        let blocked_ticks = entity.blocked_ticks;

        let check = world
            .occupancy()
            .check_footprint(world.grid(), Footprint::new(next, size), Some(id));

        match check {
            Ok(()) => {
                if let Err(reason) = world.step_entity(id, next) {
                    tracing::debug!("{} step to {} failed: {}", id, next, reason);
                    if let Some(entity) = world.entity_mut(id) {
                        entity.path_stale = true;
                    }
                    halted = Some(MoveOutcome::Blocked);
                    break;
                }
                steps += 1;

                let Some(entity) = world.entity_mut(id) else {
                    break;
                };
                entity.path.pop_front();
                entity.blocked_ticks = 0;
                if entity.footprint().distance_to(&target) <= 1 {
                    entity.path.clear();
                    entity.state = CombatState::Attacking;
                    break;
                }
            }
            Err(PlacementFailure::Occupied { by, .. })
                if should_yield(world, id, by, blocked_ticks, config) =>
            {
                tracing::trace!("{} yields to {}", id, by);
                if let Some(entity) = world.entity_mut(id) {
                    entity.blocked_ticks += 1;
                }
                halted = Some(MoveOutcome::Yielded);
                break;
            }
            Err(reason) => {
                if replanned {
                    if let Some(entity) = world.entity_mut(id) {
                        entity.path_stale = true;
                    }
                    halted = Some(MoveOutcome::Blocked);
                    break;
                }
                tracing::debug!("{} path blocked ({}), replanning", id, reason);
                if let Some(entity) = world.entity_mut(id) {
                    entity.blocked_ticks = 0;
                }
                replan(world, id, target, config);
                replanned = true;
            }
        }
    }

    if steps > 0 {
        let Some(entity) = world.entity_mut(id) else {
            return MoveOutcome::Moved(steps);
        };
        entity.last_move_tick = Some(clock.tick);
        let position = entity.position;
        world.publish(SimEvent::EntityMoved {
            entity: id,
            new_x: position.x,
            new_y: position.y,
            steps_taken: steps,
        });
        return MoveOutcome::Moved(steps);
    }

    if let Some(outcome) = halted {
        return outcome;
    }

    // Unreachable for now; aggro re-evaluates next tick
    if let Some(entity) = world.entity_mut(id) {
        entity.state = CombatState::Idle;
    }
    MoveOutcome::NoPath
}

/// Movement pass over every moving entity in registration order
pub fn run_movement_pass(
    world: &mut SimWorld,
    clock: &SimClock,
    config: &SimulationConfig,
) -> Vec<(EntityId, MoveOutcome)> {
    let mut outcomes = Vec::new();
    for id in world.entity_ids() {
        let moving = world
            .entity(id)
            .map_or(false, |e| e.state == CombatState::Moving);
        if moving {
            outcomes.push((id, advance_entity(world, id, clock, config)));
        }
    }
    outcomes
}
