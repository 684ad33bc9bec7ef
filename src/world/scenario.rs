//! Scenario files - a grid, its obstacles and the initial entities
//!
//! Scenarios are TOML:
//!
//! ```toml
//! name = "ambush"
//! width = 50
//! height = 50
//!
//! [[obstacle_lines]]
//! from = [30, 30]
//! to = [39, 30]
//!
//! [[entities]]
//! id = 1
//! x = 25
//! y = 25
//! aggressive = true
//! aggro_range = 10
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{EntityId, TileCoord};
use crate::ecs::world::SimWorld;
use crate::entity::EntityAttributes;
use crate::spatial::grid::MAX_GRID_DIMENSION;

fn default_marker() -> String {
    "wall".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleLine {
    pub from: [i32; 2],
    pub to: [i32; 2],
    #[serde(default = "default_marker")]
    pub marker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub at: [i32; 2],
    #[serde(default = "default_marker")]
    pub marker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEntity {
    pub id: u32,
    #[serde(flatten)]
    pub attributes: EntityAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub obstacle_lines: Vec<ObstacleLine>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub entities: Vec<ScenarioEntity>,
}

impl ScenarioSpec {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Aggressive raider at (25,25) with a passive mark at (33,25) on a
    /// 50x50 map, wall from (30,30) to (39,30)
    pub fn ambush() -> Self {
        Self {
            name: "ambush".into(),
            width: 50,
            height: 50,
            obstacle_lines: vec![ObstacleLine {
                from: [30, 30],
                to: [39, 30],
                marker: default_marker(),
            }],
            obstacles: Vec::new(),
            entities: vec![
                ScenarioEntity {
                    id: 1,
                    attributes: EntityAttributes::at(25, 25).named("E1").aggressive(10),
                },
                ScenarioEntity {
                    id: 2,
                    attributes: EntityAttributes::at(33, 25).named("P"),
                },
            ],
        }
    }

    /// Build the world. Rejected spawns are logged and skipped.
    pub fn build(&self, config: &SimulationConfig) -> Result<SimWorld> {
        if self.width == 0 || self.height == 0 {
            return Err(SimError::InvalidConfig(format!(
                "scenario '{}' has an empty {}x{} grid",
                self.name, self.width, self.height
            )));
        }

        if self.width > MAX_GRID_DIMENSION || self.height > MAX_GRID_DIMENSION {
            return Err(SimError::InvalidConfig(format!(
                "scenario '{}' grid {}x{} exceeds the {} tile limit per side",
                self.name, self.width, self.height, MAX_GRID_DIMENSION
            )));
        }

        let mut world = SimWorld::new(self.width, self.height);

        for line in &self.obstacle_lines {
            world.draw_obstacle_line(line.from.into(), line.to.into(), &line.marker)?;
        }
        for obstacle in &self.obstacles {
            let at: TileCoord = obstacle.at.into();
            if let Err(e) = world.place_obstacle(at, &obstacle.marker) {
                tracing::warn!("Scenario '{}': skipping obstacle: {}", self.name, e);
            }
        }

        for spawn in &self.entities {
            if let Err(e) = world.add_entity(EntityId(spawn.id), &spawn.attributes, config) {
                tracing::warn!("Scenario '{}': skipping entity: {}", self.name, e);
            }
        }

        tracing::info!(
            "Built scenario '{}': {}x{} grid, {} entities",
            self.name,
            self.width,
            self.height,
            world.entity_count()
        );
        Ok(world)
    }
}
