//! Tile Sim - tile-based spatial simulation engine
//!
//! Aggressive entities spot targets by line of sight, path to them with A*,
//! and fight in melee, all advanced one fixed tick at a time by a
//! `Scheduler` over a `SimWorld`.

pub mod combat;
pub mod core;
pub mod ecs;
pub mod entity;
pub mod simulation;
pub mod spatial;
pub mod world;

pub use crate::core::{EntityId, SimError, SimulationConfig, TileCoord};
pub use crate::ecs::SimWorld;
pub use crate::entity::EntityAttributes;
pub use crate::simulation::{Scheduler, SimEvent};
