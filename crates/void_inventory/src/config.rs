//! Container configuration

use serde::{Deserialize, Serialize};

/// Owner id used when a container is not bound to a specific player
pub const DEFAULT_OWNER_ID: &str = "Player1";

/// Default number of slots
pub const DEFAULT_CAPACITY: usize = 20;

/// Kind of container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Regular storage (backpack, chest)
    #[default]
    Standard,
    /// Holds equipped items (weapon, armor slots)
    Equipment,
}

/// Container configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Container name, unique per owner
    pub name: String,

    /// Logical owner
    pub owner_id: String,

    /// Number of slots
    pub capacity: usize,

    /// Standard or equipment
    pub kind: ContainerKind,

    /// Whether the container takes part in registry-wide save/load
    pub persistent: bool,

    /// World position dropped items spawn at
    pub drop_position: [f32; 3],
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "MainInventory".to_string(),
            owner_id: DEFAULT_OWNER_ID.to_string(),
            capacity: DEFAULT_CAPACITY,
            kind: ContainerKind::Standard,
            persistent: true,
            drop_position: [0.0, 0.0, 0.0],
        }
    }
}

impl ContainerConfig {
    /// Configuration for a standard container
    pub fn main(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            ..Default::default()
        }
    }

    /// Configuration for an equipment container
    pub fn equipment(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            kind: ContainerKind::Equipment,
            ..Default::default()
        }
    }

    /// Set owner
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    /// Set whether the container is saved with the registry
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Set drop position
    pub fn with_drop_position(mut self, position: [f32; 3]) -> Self {
        self.drop_position = position;
        self
    }
}
