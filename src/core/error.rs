use thiserror::Error;

use crate::core::types::{EntityId, TileCoord};

/// Why a footprint cannot be claimed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementFailure {
    #[error("tile {0} is out of bounds")]
    OutOfBounds(TileCoord),

    #[error("tile {0} is not walkable")]
    Blocked(TileCoord),

    #[error("tile {tile} is occupied by {by}")]
    Occupied { tile: TileCoord, by: EntityId },

    #[error("{0} still holds its previous footprint")]
    AlreadyPlaced(EntityId),
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Duplicate entity id: {0}")]
    DuplicateEntity(EntityId),

    #[error("Placement rejected for {id} at {at} (size {size}): {reason}")]
    PlacementRejected {
        id: EntityId,
        at: TileCoord,
        size: u32,
        reason: PlacementFailure,
    },

    #[error("Tile {tile} is occupied by {by}")]
    TileOccupied { tile: TileCoord, by: EntityId },

    #[error("Tile {0} is out of bounds")]
    OutOfBounds(TileCoord),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
