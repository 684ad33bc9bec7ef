//! Core type definitions used throughout the codebase

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Unique identifier for entities
///
/// Ids are assigned by the caller on spawn. Their ordering is the
/// deterministic tie-breaker for target selection and movement priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "#{}", _0)]
pub struct EntityId(pub u32);

/// Simulation tick counter (simulation time unit)
pub type Tick = u64;

/// Largest footprint edge an entity may have
pub const MAX_FOOTPRINT_SIZE: u32 = 1 << 12;

/// Integer tile coordinate on the grid
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// max(|dx|, |dy|)
    pub fn chebyshev(&self, other: &Self) -> u32 {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs();
        let dy = (self.y as i64 - other.y as i64).unsigned_abs();
        dx.max(dy) as u32
    }

    /// Saturates at the `i32` limits, which always lie off any grid
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// The 8 surrounding tiles, orthogonals first
    pub fn neighbors_8(&self) -> [TileCoord; 8] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
            self.offset(1, 1),
            self.offset(1, -1),
            self.offset(-1, 1),
            self.offset(-1, -1),
        ]
    }
}

impl From<(i32, i32)> for TileCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<[i32; 2]> for TileCoord {
    fn from([x, y]: [i32; 2]) -> Self {
        Self::new(x, y)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The N×N square of tiles an entity covers, anchored at its top-left tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub origin: TileCoord,
    pub size: u32,
}

impl Footprint {
    /// Size is clamped into `1..=MAX_FOOTPRINT_SIZE`
    pub fn new(origin: TileCoord, size: u32) -> Self {
        Self {
            origin,
            size: size.clamp(1, MAX_FOOTPRINT_SIZE),
        }
    }

    fn edge(&self) -> i32 {
        i32::try_from(self.size.max(1)).unwrap_or(i32::MAX)
    }

    /// Bottom-right tile (inclusive)
    pub fn max_corner(&self) -> TileCoord {
        let extent = self.edge() - 1;
        self.origin.offset(extent, extent)
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        let max = self.max_corner();
        coord.x >= self.origin.x && coord.x <= max.x && coord.y >= self.origin.y && coord.y <= max.y
    }

    /// All covered tiles, row by row
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> {
        let origin = self.origin;
        let size = self.edge();
        (0..size).flat_map(move |dy| (0..size).map(move |dx| origin.offset(dx, dy)))
    }

    /// Chebyshev gap between the closest tiles of two footprints
    ///
    /// Zero when the squares overlap, 1 when they touch (melee adjacency).
    pub fn distance_to(&self, other: &Footprint) -> u32 {
        let a_max = self.max_corner();
        let b_max = other.max_corner();
        let gap = |lo_a: i32, hi_a: i32, lo_b: i32, hi_b: i32| {
            (lo_a as i64 - hi_b as i64).max(lo_b as i64 - hi_a as i64).max(0)
        };
        let gap_x = gap(self.origin.x, a_max.x, other.origin.x, b_max.x);
        let gap_y = gap(self.origin.y, a_max.y, other.origin.y, b_max.y);
        u32::try_from(gap_x.max(gap_y)).unwrap_or(u32::MAX)
    }
}
