//! Canonical tile storage
//!
//! Tiles are immutable once placed except for explicit terrain edits
//! (walkability, height, static object markers).

use serde::{Deserialize, Serialize};

use crate::core::types::TileCoord;
use crate::spatial::line_of_sight::bresenham_line;

/// A single cell of the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub coord: TileCoord,
    pub walkable: bool,
    pub height: Option<i32>,
    /// Static object markers ("rock", "tree", ...)
    pub objects: Vec<String>,
}

impl Tile {
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            walkable: true,
            height: None,
            objects: Vec::new(),
        }
    }
}

/// Largest width or height a grid may have
pub const MAX_GRID_DIMENSION: u32 = 1 << 15;

/// Dense rectangular tile grid, row-major
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    pub width: u32,
    pub height: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Create an open grid where every tile is walkable.
    /// Dimensions are clamped to `MAX_GRID_DIMENSION`.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.min(MAX_GRID_DIMENSION);
        let height = height.min(MAX_GRID_DIMENSION);
        let columns = i32::try_from(width).unwrap_or(i32::MAX);
        let rows = i32::try_from(height).unwrap_or(i32::MAX);
        let tiles = (0..rows)
            .flat_map(|y| (0..columns).map(move |x| Tile::new(TileCoord::new(x, y))))
            .collect();

        Self {
            width,
            height,
            tiles,
        }
    }

    #[inline]
    fn index(&self, coord: TileCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.y as usize * self.width as usize + coord.x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as i64) < self.width as i64
            && (coord.y as i64) < self.height as i64
    }

    pub fn get(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).map(|i| &self.tiles[i])
    }

    pub fn get_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index(coord).map(move |i| &mut self.tiles[i])
    }

    /// Terrain-only walkability; out of bounds counts as blocked
    #[inline]
    pub fn is_tile_walkable(&self, coord: TileCoord) -> bool {
        self.get(coord).map_or(false, |t| t.walkable)
    }

    /// Returns false if the coordinate is out of bounds
    pub fn set_walkable(&mut self, coord: TileCoord, walkable: bool) -> bool {
        match self.get_mut(coord) {
            Some(tile) => {
                tile.walkable = walkable;
                true
            }
            None => false,
        }
    }

    pub fn set_height(&mut self, coord: TileCoord, height: Option<i32>) {
        if let Some(tile) = self.get_mut(coord) {
            tile.height = height;
        }
    }

    /// Attach a static object marker without changing walkability
    pub fn add_object(&mut self, coord: TileCoord, marker: &str) {
        if let Some(tile) = self.get_mut(coord) {
            if !tile.objects.iter().any(|o| o == marker) {
                tile.objects.push(marker.to_string());
            }
        }
    }

    /// Mark a tile unwalkable and tag it with the blocking object
    pub fn place_obstacle(&mut self, coord: TileCoord, marker: &str) {
        if self.set_walkable(coord, false) {
            self.add_object(coord, marker);
        }
    }

    /// Place obstacles along the Bresenham line between two tiles (inclusive).
    /// Returns how many in-bounds tiles were blocked.
    pub fn draw_obstacle_line(&mut self, from: TileCoord, to: TileCoord, marker: &str) -> usize {
        let mut placed = 0;
        for coord in bresenham_line(from, to) {
            if self.in_bounds(coord) {
                self.place_obstacle(coord, marker);
                placed += 1;
            }
        }
        placed
    }

    /// Remove all object markers and make the tile walkable again
    pub fn clear_tile(&mut self, coord: TileCoord) {
        if let Some(tile) = self.get_mut(coord) {
            tile.walkable = true;
            tile.objects.clear();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}
