//! Void Inventory - Slot Containers and Equipment
//!
//! This crate provides slot-based item containers, equip/unequip transfers
//! and persistence of container content against an item catalog.
//!
//! # Features
//!
//! - Immutable item definitions shared by runtime item instances
//! - Fixed-capacity containers with stacking and per-item quantity caps
//! - Move, swap and cross-container transfers without duplication
//! - Use protocol with per-item effect hooks
//! - Equipment containers with single-slot auto-swap
//! - World pickups and drops through a spawn collaborator
//! - Save/load through a blob store, resolved against a catalog
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use void_inventory::prelude::*;
//!
//! let registry = Arc::new(ContainerRegistry::new());
//! let main = registry.register(Container::new(ContainerConfig::main("MainInventory", 20)))?;
//! registry.register(Container::new(ContainerConfig::equipment("Weapon", 1)))?;
//!
//! let sword = ItemInstance::from_definition(
//!     ItemDefinition::new("iron_sword", "Iron Sword").equippable("Weapon"),
//! );
//! main.lock().add(&sword, 1)?;
//!
//! let mut equipment = EquipmentCoordinator::new(Arc::clone(&registry));
//! equipment.equip(&main.lock().key(), 0)?;
//! ```

pub mod catalog;
pub mod config;
pub mod container;
pub mod effects;
pub mod equipment;
pub mod error;
pub mod events;
pub mod item;
pub mod persistence;
pub mod pickup;
pub mod registry;

pub mod prelude {
    pub use crate::catalog::{Catalog, ItemCatalog};
    pub use crate::config::{ContainerConfig, ContainerKind, DEFAULT_CAPACITY, DEFAULT_OWNER_ID};
    pub use crate::container::{Container, Placement};
    pub use crate::effects::{ItemEffects, NoEffects, SharedEffects};
    pub use crate::equipment::{EquipmentCoordinator, PickupHandle, PickupSpawner};
    pub use crate::error::{InventoryError, Permission, Result};
    pub use crate::events::{EventDispatcher, InventoryEvent, InventoryEventKind};
    pub use crate::item::{ItemDefinition, ItemInstance};
    pub use crate::persistence::{
        BlobStore, FileBlobStore, LoadReport, MemoryBlobStore, PersistenceCodec, PersistenceError,
        SaveFormat, SerializedContainer,
    };
    pub use crate::pickup::ItemPicker;
    pub use crate::registry::{ContainerKey, ContainerRegistry, SharedContainer};
}

pub use prelude::*;
