pub mod config;
pub mod error;
pub mod types;

pub use config::{CombatTuning, EntityDefaults, SimulationConfig};
pub use error::{PlacementFailure, Result, SimError};
pub use types::{EntityId, Footprint, Tick, TileCoord, MAX_FOOTPRINT_SIZE};
