//! A* pathfinding over the tile grid
//!
//! 8-connected, orthogonal steps cost 1 and diagonal steps cost sqrt(2).
//! The Chebyshev heuristic never overestimates that cost model, so returned
//! paths are optimal. Searches are bounded by an expansion budget so an
//! unreachable goal costs at most `max_expansions` node visits.
//!
//! Paths exclude the start tile and include the destination. An empty path
//! means "already there" or "no route within budget"; neither is an error.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;

use crate::core::types::{EntityId, Footprint, TileCoord};
use crate::spatial::grid::TileGrid;
use crate::spatial::occupancy::OccupancyIndex;

pub const ORTHOGONAL_COST: f32 = 1.0;
pub const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

/// Default expansion budget per search
pub const DEFAULT_MAX_EXPANSIONS: usize = 1000;

/// Who is moving and how much searching they get
#[derive(Debug, Clone, Copy)]
pub struct PathRequest {
    pub start: TileCoord,
    /// Footprint edge length of the mover
    pub size: u32,
    /// The mover's own tiles never block it
    pub mover: Option<EntityId>,
    pub max_expansions: usize,
}

impl PathRequest {
    pub fn new(start: TileCoord, size: u32) -> Self {
        Self {
            start,
            size: size.max(1),
            mover: None,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }

    pub fn for_entity(mut self, mover: EntityId) -> Self {
        self.mover = Some(mover);
        self
    }

    pub fn with_budget(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }
}

/// Open set entry; field order is the priority order (f, then h, then FIFO)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Frontier {
    f_cost: OrderedFloat<f32>,
    h_cost: OrderedFloat<f32>,
    seq: u32,
    coord: TileCoord,
}

fn step_cost(from: TileCoord, to: TileCoord) -> f32 {
    if from.x != to.x && from.y != to.y {
        DIAGONAL_COST
    } else {
        ORTHOGONAL_COST
    }
}

/// Sum of step costs along a path starting at `start`
pub fn path_cost(start: TileCoord, path: &[TileCoord]) -> f32 {
    let mut prev = start;
    let mut total = 0.0;
    for &tile in path {
        total += step_cost(prev, tile);
        prev = tile;
    }
    total
}

/// Find a path for a footprint of `size` from `start` to the exact anchor `goal`
pub fn find_path(
    grid: &TileGrid,
    occupancy: &OccupancyIndex,
    request: PathRequest,
    goal: TileCoord,
) -> Vec<TileCoord> {
    if request.start == goal {
        return Vec::new();
    }
    let goal_fp = Footprint::new(goal, request.size);
    if occupancy
        .check_footprint(grid, goal_fp, request.mover)
        .is_err()
    {
        return Vec::new();
    }

    search(
        grid,
        occupancy,
        request,
        |c| c.chebyshev(&goal) as f32,
        |c| c == goal,
    )
}

/// Find a path to any anchor from which the mover's footprint touches
/// `target` (footprint distance exactly 1, i.e. melee adjacency)
pub fn find_path_to_adjacent(
    grid: &TileGrid,
    occupancy: &OccupancyIndex,
    request: PathRequest,
    target: Footprint,
) -> Vec<TileCoord> {
    let size = request.size;
    let gap = move |c: TileCoord| Footprint::new(c, size).distance_to(&target);

    if gap(request.start) == 1 {
        return Vec::new();
    }

    search(
        grid,
        occupancy,
        request,
        move |c| gap(c).saturating_sub(1) as f32,
        move |c| gap(c) == 1,
    )
}

fn search(
    grid: &TileGrid,
    occupancy: &OccupancyIndex,
    request: PathRequest,
    heuristic: impl Fn(TileCoord) -> f32,
    is_goal: impl Fn(TileCoord) -> bool,
) -> Vec<TileCoord> {
    let passable = |c: TileCoord| {
        occupancy
            .check_footprint(grid, Footprint::new(c, request.size), request.mover)
            .is_ok()
    };

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<TileCoord, TileCoord> = AHashMap::new();
    let mut g_scores: AHashMap<TileCoord, f32> = AHashMap::new();
    let mut closed: AHashSet<TileCoord> = AHashSet::new();
    let mut seq = 0u32;
    let mut expansions = 0usize;

    let h = heuristic(request.start);
    g_scores.insert(request.start, 0.0);
    open_set.push(Reverse(Frontier {
        f_cost: OrderedFloat(h),
        h_cost: OrderedFloat(h),
        seq,
        coord: request.start,
    }));

    while let Some(Reverse(current)) = open_set.pop() {
        let coord = current.coord;
        if !closed.insert(coord) {
            // Stale duplicate of an already expanded node
            continue;
        }

        if is_goal(coord) {
            return reconstruct_path(&came_from, request.start, coord);
        }

        expansions += 1;
        if expansions > request.max_expansions {
            tracing::trace!(
                "pathfinding budget of {} expansions exhausted from {}",
                request.max_expansions,
                request.start
            );
            return Vec::new();
        }

        let current_g = g_scores.get(&coord).copied().unwrap_or(f32::INFINITY);

        for neighbor in coord.neighbors_8() {
            if closed.contains(&neighbor) || !passable(neighbor) {
                continue;
            }

            // No squeezing diagonally between two blocked orthogonals
            let dx = neighbor.x - coord.x;
            let dy = neighbor.y - coord.y;
            let diagonal = dx != 0 && dy != 0;
            if diagonal && !passable(coord.offset(dx, 0)) && !passable(coord.offset(0, dy)) {
                continue;
            }

            let tentative_g = current_g + step_cost(coord, neighbor);
            let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(f32::INFINITY);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, coord);
                g_scores.insert(neighbor, tentative_g);

                let h = heuristic(neighbor);
                seq += 1;
                open_set.push(Reverse(Frontier {
                    f_cost: OrderedFloat(tentative_g + h),
                    h_cost: OrderedFloat(h),
                    seq,
                    coord: neighbor,
                }));
            }
        }
    }

    Vec::new()
}

/// Walk `came_from` back to the start; the start itself is left out
fn reconstruct_path(
    came_from: &AHashMap<TileCoord, TileCoord>,
    start: TileCoord,
    mut current: TileCoord,
) -> Vec<TileCoord> {
    let mut path = Vec::new();
    while current != start {
        path.push(current);
        match came_from.get(&current) {
            Some(&prev) => current = prev,
            None => break,
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(width: u32, height: u32) -> (TileGrid, OccupancyIndex) {
        (TileGrid::new(width, height), OccupancyIndex::new())
    }

    #[test]
    fn test_pathfind_straight_line() {
        let (grid, occ) = open(10, 10);
        let start = TileCoord::new(0, 0);
        let goal = TileCoord::new(5, 0);

        let path = find_path(&grid, &occ, PathRequest::new(start, 1), goal);

        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), Some(&TileCoord::new(1, 0)));
        assert_eq!(path.last(), Some(&goal));
        assert_eq!(path_cost(start, &path), 5.0);
    }

    #[test]
    fn test_pathfind_diagonal_is_optimal() {
        let (grid, occ) = open(10, 10);
        let start = TileCoord::new(0, 0);
        let path = find_path(&grid, &occ, PathRequest::new(start, 1), TileCoord::new(4, 4));

        assert_eq!(path.len(), 4);
        assert!((path_cost(start, &path) - 4.0 * DIAGONAL_COST).abs() < 1e-4);
    }

    #[test]
    fn test_pathfind_same_start_goal() {
        let (grid, occ) = open(10, 10);
        let start = TileCoord::new(5, 5);
        assert!(find_path(&grid, &occ, PathRequest::new(start, 1), start).is_empty());
    }

    #[test]
    fn test_pathfind_around_obstacle() {
        let (mut grid, occ) = open(10, 10);
        for y in 0..8 {
            grid.set_walkable(TileCoord::new(4, y), false);
        }
        let start = TileCoord::new(0, 0);
        let goal = TileCoord::new(8, 0);

        let path = find_path(&grid, &occ, PathRequest::new(start, 1), goal);

        assert_eq!(path.last(), Some(&goal));
        assert!(path.iter().all(|t| t.x != 4 || t.y >= 8));
        assert!(path_cost(start, &path) >= start.chebyshev(&goal) as f32);
    }

    #[test]
    fn test_pathfind_no_path() {
        let (mut grid, occ) = open(10, 10);
        let goal = TileCoord::new(5, 5);
        for n in goal.neighbors_8() {
            grid.set_walkable(n, false);
        }

        let path = find_path(&grid, &occ, PathRequest::new(TileCoord::new(0, 0), 1), goal);
        assert!(path.is_empty());
    }

    #[test]
    fn test_budget_bounds_search() {
        let (mut grid, occ) = open(60, 60);
        // Seal off the goal so the search must flood the whole map
        let goal = TileCoord::new(50, 50);
        for n in goal.neighbors_8() {
            grid.set_walkable(n, false);
        }
        let request = PathRequest::new(TileCoord::new(0, 0), 1).with_budget(10);
        assert!(find_path(&grid, &occ, request, goal).is_empty());

        // A reachable goal beyond a tiny budget is also reported unreachable
        let request = PathRequest::new(TileCoord::new(0, 0), 1).with_budget(3);
        assert!(find_path(&grid, &occ, request, TileCoord::new(30, 0)).is_empty());
    }

    #[test]
    fn test_occupied_tiles_are_avoided_except_own() {
        let (grid, mut occ) = open(10, 3);
        let mover = EntityId(1);
        occ.place(&grid, mover, TileCoord::new(0, 1), 1);
        occ.place(&grid, EntityId(2), TileCoord::new(2, 1), 1);

        let request = PathRequest::new(TileCoord::new(0, 1), 1).for_entity(mover);
        let path = find_path(&grid, &occ, request, TileCoord::new(4, 1));

        assert!(!path.contains(&TileCoord::new(2, 1)));
        assert_eq!(path.last(), Some(&TileCoord::new(4, 1)));
    }

    #[test]
    fn test_no_diagonal_squeeze() {
        let (mut grid, occ) = open(3, 3);
        // Only a diagonal gap between (0,0) and (1,1)
        grid.set_walkable(TileCoord::new(1, 0), false);
        grid.set_walkable(TileCoord::new(0, 1), false);
        grid.set_walkable(TileCoord::new(2, 0), false);
        grid.set_walkable(TileCoord::new(0, 2), false);

        let request = PathRequest::new(TileCoord::new(0, 0), 1);
        let path = find_path(&grid, &occ, request, TileCoord::new(2, 2));
        assert!(path.is_empty());
    }

    #[test]
    fn test_large_footprint_needs_wide_corridor() {
        let (mut grid, occ) = open(10, 10);
        // Wall at x=5 with a one tile gap at y=5
        for y in 0..10 {
            if y != 5 {
                grid.set_walkable(TileCoord::new(5, y), false);
            }
        }
        let start = TileCoord::new(1, 1);
        let goal = TileCoord::new(7, 1);

        assert!(!find_path(&grid, &occ, PathRequest::new(start, 1), goal).is_empty());
        assert!(find_path(&grid, &occ, PathRequest::new(start, 2), goal).is_empty());
    }

    #[test]
    fn test_path_to_adjacent_stops_next_to_target() {
        let (grid, mut occ) = open(20, 20);
        let target = Footprint::new(TileCoord::new(10, 5), 1);
        occ.place(&grid, EntityId(9), target.origin, 1);

        let start = TileCoord::new(2, 5);
        let path = find_path_to_adjacent(&grid, &occ, PathRequest::new(start, 1), target);

        let end = *path.last().unwrap();
        assert_eq!(Footprint::new(end, 1).distance_to(&target), 1);
        assert_eq!(path.len(), 7);
    }

    #[test]
    fn test_path_to_adjacent_when_already_adjacent() {
        let (grid, occ) = open(10, 10);
        let target = Footprint::new(TileCoord::new(3, 3), 2);
        let path = find_path_to_adjacent(
            &grid,
            &occ,
            PathRequest::new(TileCoord::new(5, 5), 1),
            target,
        );
        assert!(path.is_empty());
    }
}
