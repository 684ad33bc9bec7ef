//! Scenario loading and debug views

pub mod scenario;
pub mod snapshot;

pub use scenario::{Obstacle, ObstacleLine, ScenarioEntity, ScenarioSpec};
pub use snapshot::{snapshot, state_counts, status, EntityStatus, GridSnapshot};
