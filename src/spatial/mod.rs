//! Spatial layer: tile storage, occupancy, visibility and pathfinding

pub mod grid;
pub mod line_of_sight;
pub mod occupancy;
pub mod pathfinding;

pub use grid::{Tile, TileGrid, MAX_GRID_DIMENSION};
pub use line_of_sight::{bresenham_line, has_line_of_sight, sight_line};
pub use occupancy::OccupancyIndex;
pub use pathfinding::{find_path, find_path_to_adjacent, path_cost, PathRequest};
