//! Simulation world - grid, occupancy and the entity registry
//!
//! All placement goes through the occupancy index; entity positions are
//! only ever changed by clear-then-place so the index and the registry
//! never disagree.

use ahash::AHashMap;
use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::error::{PlacementFailure, Result, SimError};
use crate::core::types::{EntityId, Footprint, TileCoord};
use crate::entity::{Entity, EntityAttributes};
use crate::simulation::events::{EventBus, EventSubscription, SimEvent};
use crate::spatial::grid::TileGrid;
use crate::spatial::occupancy::OccupancyIndex;

/// One result of a range query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeEntry {
    pub entity: EntityId,
    pub distance: u32,
}

#[derive(Debug)]
pub struct SimWorld {
    grid: TileGrid,
    occupancy: OccupancyIndex,
    entities: AHashMap<EntityId, Entity>,
    /// Registration order; every per-tick pass walks this
    order: Vec<EntityId>,
    events: EventBus,
}

impl SimWorld {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_grid(TileGrid::new(width, height))
    }

    pub fn with_grid(grid: TileGrid) -> Self {
        Self {
            grid,
            occupancy: OccupancyIndex::new(),
            entities: AHashMap::new(),
            order: Vec::new(),
            events: EventBus::new(),
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn subscribe(&mut self) -> EventSubscription {
        self.events.subscribe()
    }

    pub(crate) fn publish(&mut self, event: SimEvent) {
        self.events.publish(event);
    }

    // === ENTITY LIFECYCLE ===

    /// Spawn an entity. Rejected (nothing mutated) if the id is taken or
    /// the footprint is not fully walkable and free.
    pub fn add_entity(
        &mut self,
        id: EntityId,
        attributes: &EntityAttributes,
        config: &SimulationConfig,
    ) -> Result<&Entity> {
        if self.entities.contains_key(&id) {
            tracing::warn!("Spawn of {} rejected: id already registered", id);
            return Err(SimError::DuplicateEntity(id));
        }

        let entity = Entity::from_attributes(id, attributes, &config.entity_defaults);
        if let Err(reason) = self
            .occupancy
            .try_place(&self.grid, id, entity.position, entity.size)
        {
            tracing::warn!(
                "Spawn of {} at {} rejected: {}",
                id,
                entity.position,
                reason
            );
            return Err(SimError::PlacementRejected {
                id,
                at: entity.position,
                size: entity.size,
                reason,
            });
        }

        tracing::info!(
            "Added {} at {} (size {}, aggressive: {})",
            entity.display_name(),
            entity.position,
            entity.size,
            entity.aggressive
        );
        self.publish(SimEvent::EntityAdded {
            entity: id,
            x: entity.position.x,
            y: entity.position.y,
            size: entity.size,
        });
        self.order.push(id);
        self.entities.insert(id, entity);
        self.entities.get(&id).ok_or(SimError::EntityNotFound(id))
    }

    /// Remove an entity and every reference to it. Call between ticks.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<Entity> {
        let entity = self
            .entities
            .remove(&id)
            .ok_or(SimError::EntityNotFound(id))?;

        self.occupancy.clear_entity(id);
        self.order.retain(|&e| e != id);
        for other in self.entities.values_mut() {
            if other.target == Some(id) {
                other.clear_target();
            }
        }

        tracing::info!("Removed {}", entity.display_name());
        self.publish(SimEvent::EntityRemoved { entity: id });
        Ok(entity)
    }

    /// Teleport an entity. On rejection the entity stays where it was.
    pub fn relocate_entity(&mut self, id: EntityId, to: TileCoord) -> Result<()> {
        let size = self
            .entities
            .get(&id)
            .map(|e| e.size)
            .ok_or(SimError::EntityNotFound(id))?;

        self.step_entity(id, to).map_err(|reason| SimError::PlacementRejected {
            id,
            at: to,
            size,
            reason,
        })?;

        if let Some(entity) = self.entities.get_mut(&id) {
            entity.path.clear();
            entity.path_stale = false;
        }
        Ok(())
    }

    /// Move an entity's footprint anchor with clear-then-place. If the new
    /// footprint cannot be claimed the old one is restored.
    pub(crate) fn step_entity(
        &mut self,
        id: EntityId,
        to: TileCoord,
    ) -> std::result::Result<(), PlacementFailure> {
        let Some(entity) = self.entities.get_mut(&id) else {
            return Ok(());
        };
        let from = entity.position;
        let size = entity.size;

        self.occupancy.clear(id, from, size);
        match self.occupancy.try_place(&self.grid, id, to, size) {
            Ok(()) => {
                entity.position = to;
                Ok(())
            }
            Err(reason) => {
                // Old footprint was released above and nothing else ran since
                if let Err(restore) = self.occupancy.try_place(&self.grid, id, from, size) {
                    tracing::error!("{} could not be restored to {}: {}", id, from, restore);
                }
                Err(reason)
            }
        }
    }

    // === QUERIES ===

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Entities in registration order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.order.iter().filter_map(move |id| self.entities.get(id))
    }

    /// Snapshot of the registration order, safe to iterate while mutating
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.order.clone()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn occupant_at(&self, coord: TileCoord) -> Option<EntityId> {
        self.occupancy.occupant_at(coord)
    }

    pub fn tiles_of(&self, id: EntityId) -> Vec<TileCoord> {
        self.occupancy.tiles_of(id)
    }

    /// Other entities within `radius` footprint distance of `id`, nearest
    /// first, ties broken by id. Corpses in their grace period are included.
    pub fn entities_in_range(&self, id: EntityId, radius: u32) -> Result<Vec<RangeEntry>> {
        let origin = self.entity(id).ok_or(SimError::EntityNotFound(id))?;

        let mut found: Vec<RangeEntry> = self
            .entities()
            .filter(|other| other.id != id)
            .map(|other| RangeEntry {
                entity: other.id,
                distance: origin.distance_to(other),
            })
            .filter(|entry| entry.distance <= radius)
            .collect();
        found.sort_by_key(|entry| (entry.distance, entry.entity));
        Ok(found)
    }

    /// True when every entity's indexed tiles exactly equal its footprint
    /// and the index lists no unregistered entity
    pub fn occupancy_consistent(&self) -> bool {
        let entities_ok = self.entities.values().all(|entity| {
            let mut expected: Vec<TileCoord> = entity.footprint().tiles().collect();
            expected.sort();
            self.occupancy.tiles_of(entity.id) == expected
                && self.occupancy.footprint_of(entity.id) == Some(entity.footprint())
        });
        let covered: usize = self
            .entities
            .values()
            .map(|e| (e.size as usize) * (e.size as usize))
            .sum();
        entities_ok
            && self.occupancy.entity_count() == self.entities.len()
            && self.occupancy.occupied_tile_count() == covered
    }

    // === TERRAIN EDITS ===

    fn ensure_editable(&self, coord: TileCoord) -> Result<()> {
        if !self.grid.in_bounds(coord) {
            return Err(SimError::OutOfBounds(coord));
        }
        if let Some(by) = self.occupancy.occupant_at(coord) {
            return Err(SimError::TileOccupied { tile: coord, by });
        }
        Ok(())
    }

    /// Blocking an occupied tile is refused; unblocking always succeeds
    pub fn set_walkable(&mut self, coord: TileCoord, walkable: bool) -> Result<()> {
        if walkable {
            if !self.grid.set_walkable(coord, true) {
                return Err(SimError::OutOfBounds(coord));
            }
            return Ok(());
        }
        self.ensure_editable(coord)?;
        self.grid.set_walkable(coord, false);
        Ok(())
    }

    pub fn set_height(&mut self, coord: TileCoord, height: Option<i32>) -> Result<()> {
        if !self.grid.in_bounds(coord) {
            return Err(SimError::OutOfBounds(coord));
        }
        self.grid.set_height(coord, height);
        Ok(())
    }

    pub fn add_object(&mut self, coord: TileCoord, marker: &str) -> Result<()> {
        if !self.grid.in_bounds(coord) {
            return Err(SimError::OutOfBounds(coord));
        }
        self.grid.add_object(coord, marker);
        Ok(())
    }

    pub fn place_obstacle(&mut self, coord: TileCoord, marker: &str) -> Result<()> {
        self.ensure_editable(coord)?;
        self.grid.place_obstacle(coord, marker);
        Ok(())
    }

    /// Obstacle line between two tiles. All-or-nothing: if any in-bounds
    /// tile on the line is occupied nothing is placed.
    pub fn draw_obstacle_line(
        &mut self,
        from: TileCoord,
        to: TileCoord,
        marker: &str,
    ) -> Result<usize> {
        for coord in crate::spatial::line_of_sight::bresenham_line(from, to) {
            if let Some(by) = self.occupancy.occupant_at(coord) {
                return Err(SimError::TileOccupied { tile: coord, by });
            }
        }
        Ok(self.grid.draw_obstacle_line(from, to, marker))
    }

    pub fn footprint_of(&self, id: EntityId) -> Option<Footprint> {
        self.occupancy.footprint_of(id)
    }
}
