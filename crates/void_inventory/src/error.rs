//! Error types for the inventory engine

use std::fmt;
use thiserror::Error;

/// Result type for inventory operations
pub type Result<T> = std::result::Result<T, InventoryError>;

/// Item flag that gates an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Usable,
    Equippable,
    Droppable,
    Movable,
    Swappable,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Usable => "usable",
            Self::Equippable => "equippable",
            Self::Droppable => "droppable",
            Self::Movable => "movable",
            Self::Swappable => "swappable",
        };
        f.write_str(name)
    }
}

/// Errors raised by container, equipment and pickup operations.
///
/// All of these are recoverable: the operation that detects one leaves the
/// container untouched and reports it to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// Slot index outside `[0, capacity)`
    #[error("Slot index {index} out of range for container '{container}' (capacity {capacity})")]
    InvalidIndex {
        container: String,
        index: usize,
        capacity: usize,
    },

    /// A non-empty slot was required
    #[error("Slot {index} of container '{container}' is empty")]
    EmptySlot { container: String, index: usize },

    /// The null item was passed where a real item was required
    #[error("Cannot operate on a null item")]
    NullItem,

    /// No free slot to place the item into
    #[error("Container '{container}' has no room for '{item_id}'")]
    CapacityExceeded { container: String, item_id: String },

    /// Requested quantity exceeds the item's container-wide maximum
    #[error("Quantity of '{item_id}' capped at {maximum} in container '{container}'")]
    QuantityCapExceeded {
        container: String,
        item_id: String,
        maximum: u32,
    },

    /// An item flag forbids the operation
    #[error("Item '{item_id}' is not {permission}")]
    PermissionDenied {
        item_id: String,
        permission: Permission,
    },

    /// An item id is missing from the catalog
    #[error("Item '{0}' not found in catalog")]
    UnresolvedCatalogEntry(String),

    /// Destination slot holds an incompatible item
    #[error("Slot {index} of container '{container}' is occupied")]
    DestinationOccupied { container: String, index: usize },

    /// Fewer items held than requested for removal
    #[error("Container '{container}' holds {available} of '{item_id}', {requested} requested")]
    InsufficientQuantity {
        container: String,
        item_id: String,
        requested: u32,
        available: u32,
    },

    /// No container registered under this name and owner
    #[error("Container '{name}' not registered for owner '{owner_id}'")]
    ContainerNotFound { name: String, owner_id: String },

    /// A container with this name and owner is already registered
    #[error("Container '{name}' already registered for owner '{owner_id}'")]
    DuplicateContainer { name: String, owner_id: String },

    /// The operation targets a container of the wrong kind, or its own source
    #[error("Invalid target container '{0}'")]
    InvalidTarget(String),

    /// An item effect hook refused the action
    #[error("Effect hook of '{0}' rejected the action")]
    EffectRejected(String),
}

impl InventoryError {
    /// Create a permission denied error
    pub fn permission_denied(item_id: impl Into<String>, permission: Permission) -> Self {
        InventoryError::PermissionDenied {
            item_id: item_id.into(),
            permission,
        }
    }

    /// Create a container not found error
    pub fn container_not_found(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        InventoryError::ContainerNotFound {
            name: name.into(),
            owner_id: owner_id.into(),
        }
    }

    /// Slot index carried by this error, if any
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::InvalidIndex { index, .. }
            | Self::EmptySlot { index, .. }
            | Self::DestinationOccupied { index, .. } => Some(*index),
            _ => None,
        }
    }
}
