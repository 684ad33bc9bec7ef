//! Line of sight over terrain
//!
//! Integer Bresenham rasterisation. The line is always walked from the
//! lexicographically smaller endpoint, so `A -> B` and `B -> A` traverse the
//! same tiles and give the same answer. Only tiles strictly between the
//! endpoints are tested; entities never block sight.

use crate::core::types::TileCoord;
use crate::spatial::grid::TileGrid;

/// Tiles on the Bresenham line from `from` to `to`, both endpoints included
pub fn bresenham_line(from: TileCoord, to: TileCoord) -> Vec<TileCoord> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };

    let mut points = Vec::with_capacity(dx.max(-dy) as usize + 1);
    let (mut x, mut y) = (from.x, from.y);
    let mut err = dx + dy;

    loop {
        points.push(TileCoord::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }

    points
}

/// The traversed tiles in canonical (direction independent) order
pub fn sight_line(a: TileCoord, b: TileCoord) -> Vec<TileCoord> {
    if a <= b {
        bresenham_line(a, b)
    } else {
        let mut line = bresenham_line(b, a);
        line.reverse();
        line
    }
}

/// Check line of sight between two tiles
///
/// False as soon as a tile strictly between the endpoints is unwalkable or
/// off the grid. A tile always sees itself.
pub fn has_line_of_sight(grid: &TileGrid, from: TileCoord, to: TileCoord) -> bool {
    if from == to {
        return true;
    }

    let line = sight_line(from, to);
    line.iter()
        .skip(1)
        .take(line.len().saturating_sub(2))
        .all(|&tile| grid.is_tile_walkable(tile))
}
