//! Occupancy index - the authoritative tile -> entity mapping
//!
//! Collision checks always go through here. An entity's footprint is
//! claimed with `place` and released with `clear`; moving is clear-then-place,
//! never an in-place edit of a live entry.

use ahash::AHashMap;

use crate::core::error::PlacementFailure;
use crate::core::types::{EntityId, Footprint, TileCoord};
use crate::spatial::grid::TileGrid;

#[derive(Debug, Clone, Default)]
pub struct OccupancyIndex {
    /// Each tile is claimed by at most one entity
    tiles: AHashMap<TileCoord, EntityId>,
    /// Reverse lookup: the footprint each placed entity currently claims
    footprints: AHashMap<EntityId, Footprint>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that every tile of the footprint is in bounds, walkable and
    /// unclaimed. Tiles claimed by `ignore` count as free.
    pub fn check_footprint(
        &self,
        grid: &TileGrid,
        footprint: Footprint,
        ignore: Option<EntityId>,
    ) -> Result<(), PlacementFailure> {
        for tile in footprint.tiles() {
            let Some(cell) = grid.get(tile) else {
                return Err(PlacementFailure::OutOfBounds(tile));
            };
            if !cell.walkable {
                return Err(PlacementFailure::Blocked(tile));
            }
            if let Some(&by) = self.tiles.get(&tile) {
                if Some(by) != ignore {
                    return Err(PlacementFailure::Occupied { tile, by });
                }
            }
        }
        Ok(())
    }

    /// False if any covered tile is out of bounds, unwalkable or occupied
    pub fn is_walkable(&self, grid: &TileGrid, origin: TileCoord, size: u32) -> bool {
        self.check_footprint(grid, Footprint::new(origin, size), None).is_ok()
    }

    /// Like `is_walkable`, but the mover's own tiles do not block it
    pub fn is_walkable_for(
        &self,
        grid: &TileGrid,
        origin: TileCoord,
        size: u32,
        mover: EntityId,
    ) -> bool {
        self.check_footprint(grid, Footprint::new(origin, size), Some(mover)).is_ok()
    }

    /// Claim a footprint. Fails without mutating anything.
    ///
    /// The entity must not hold a footprint already: `clear` it first.
    pub fn try_place(
        &mut self,
        grid: &TileGrid,
        id: EntityId,
        origin: TileCoord,
        size: u32,
    ) -> Result<(), PlacementFailure> {
        if self.footprints.contains_key(&id) {
            return Err(PlacementFailure::AlreadyPlaced(id));
        }

        let footprint = Footprint::new(origin, size);
        self.check_footprint(grid, footprint, None)?;

        for tile in footprint.tiles() {
            self.tiles.insert(tile, id);
        }
        self.footprints.insert(id, footprint);
        Ok(())
    }

    pub fn place(&mut self, grid: &TileGrid, id: EntityId, origin: TileCoord, size: u32) -> bool {
        self.try_place(grid, id, origin, size).is_ok()
    }

    /// Release the entries `id` holds inside the given footprint
    pub fn clear(&mut self, id: EntityId, origin: TileCoord, size: u32) {
        let footprint = Footprint::new(origin, size);
        for tile in footprint.tiles() {
            if self.tiles.get(&tile) == Some(&id) {
                self.tiles.remove(&tile);
            }
        }
        let released = self.footprints.get(&id).map_or(false, |held| {
            footprint.contains(held.origin) && footprint.contains(held.max_corner())
        });
        if released {
            self.footprints.remove(&id);
        }
    }

    /// Release whatever footprint `id` currently holds
    pub fn clear_entity(&mut self, id: EntityId) {
        if let Some(footprint) = self.footprints.get(&id).copied() {
            self.clear(id, footprint.origin, footprint.size);
        }
    }

    pub fn occupant_at(&self, coord: TileCoord) -> Option<EntityId> {
        self.tiles.get(&coord).copied()
    }

    pub fn footprint_of(&self, id: EntityId) -> Option<Footprint> {
        self.footprints.get(&id).copied()
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.footprints.contains_key(&id)
    }

    /// Every tile the index lists for `id`, sorted. Scans the whole index.
    pub fn tiles_of(&self, id: EntityId) -> Vec<TileCoord> {
        let mut tiles: Vec<TileCoord> = self
            .tiles
            .iter()
            .filter(|(_, e)| **e == id)
            .map(|(&t, _)| t)
            .collect();
        tiles.sort();
        tiles
    }

    pub fn occupied_tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn entity_count(&self) -> usize {
        self.footprints.len()
    }
}
