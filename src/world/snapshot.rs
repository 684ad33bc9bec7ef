//! Read-only debug views of the world
//!
//! `snapshot` renders a clipped window of the grid as text rows:
//! `#` obstacle, `.` empty, `@` living entity, `x` corpse awaiting removal.
//! `status` dumps per-entity state in registration order.

use std::fmt;

use serde::Serialize;

use crate::core::types::{EntityId, TileCoord};
use crate::ecs::world::SimWorld;
use crate::entity::CombatState;

pub const OBSTACLE: char = '#';
pub const EMPTY: char = '.';
pub const LIVING: char = '@';
pub const CORPSE: char = 'x';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridSnapshot {
    /// Top-left tile of the rendered window after clipping
    pub origin: TileCoord,
    pub width: u32,
    pub height: u32,
    pub rows: Vec<String>,
}

impl GridSnapshot {
    pub fn cell(&self, coord: TileCoord) -> Option<char> {
        let dx = coord.x - self.origin.x;
        let dy = coord.y - self.origin.y;
        if dx < 0 || dy < 0 {
            return None;
        }
        self.rows.get(dy as usize)?.chars().nth(dx as usize)
    }
}

impl fmt::Display for GridSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

/// Render the window `[origin, origin + size)` clipped to the grid
pub fn snapshot(world: &SimWorld, origin: TileCoord, width: u32, height: u32) -> GridSnapshot {
    let grid = world.grid();
    let x0 = origin.x.max(0) as i64;
    let y0 = origin.y.max(0) as i64;
    let x1 = (origin.x as i64 + width as i64).min(grid.width as i64);
    let y1 = (origin.y as i64 + height as i64).min(grid.height as i64);

    let mut rows = Vec::new();
    for y in y0..y1 {
        let row: String = (x0..x1)
            .map(|x| {
                let coord = TileCoord::new(x as i32, y as i32);
                match world.occupant_at(coord).and_then(|id| world.entity(id)) {
                    Some(entity) if entity.is_dead() => CORPSE,
                    Some(_) => LIVING,
                    None if !grid.is_tile_walkable(coord) => OBSTACLE,
                    None => EMPTY,
                }
            })
            .collect();
        rows.push(row);
    }

    GridSnapshot {
        origin: TileCoord::new(x0 as i32, y0 as i32),
        width: (x1 - x0).max(0) as u32,
        height: rows.len() as u32,
        rows,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityStatus {
    pub id: EntityId,
    pub name: Option<String>,
    pub x: i32,
    pub y: i32,
    pub size: u32,
    pub health: i32,
    pub max_health: i32,
    pub state: CombatState,
    pub target: Option<EntityId>,
    pub path_len: usize,
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>4} {:<10} ({:>3},{:>3}) hp {:>4}/{:<4} {:<9}",
            self.id.to_string(),
            self.name.as_deref().unwrap_or("-"),
            self.x,
            self.y,
            self.health,
            self.max_health,
            self.state.to_string()
        )?;
        if let Some(target) = self.target {
            write!(f, " -> {}", target)?;
        }
        Ok(())
    }
}

pub fn status(world: &SimWorld) -> Vec<EntityStatus> {
    world
        .entities()
        .map(|e| EntityStatus {
            id: e.id,
            name: e.name.clone(),
            x: e.position.x,
            y: e.position.y,
            size: e.size,
            health: e.stats.health,
            max_health: e.stats.max_health,
            state: e.state,
            target: e.target,
            path_len: e.path.len(),
        })
        .collect()
}

/// Entity count per combat state
pub fn state_counts(world: &SimWorld) -> [(CombatState, usize); 4] {
    let mut counts = [
        (CombatState::Idle, 0),
        (CombatState::Moving, 0),
        (CombatState::Attacking, 0),
        (CombatState::Dead, 0),
    ];
    for entity in world.entities() {
        if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == entity.state) {
            slot.1 += 1;
        }
    }
    counts
}
