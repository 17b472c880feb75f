//! Item definitions and instances

use crate::effects::{no_effects, EffectsDebug, SharedEffects};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Container name items are added to when none is given
pub const DEFAULT_TARGET_CONTAINER: &str = "MainInventory";

/// Item definition
///
/// Immutable catalog record describing one kind of item. Every field other
/// than quantity is resolved from the catalog, so instances share their
/// definition instead of copying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDefinition {
    /// Unique identifier (empty = no item)
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Icon path
    pub icon: String,
    /// Container this item is normally added to
    pub target_container: String,
    /// Maximum quantity in a single slot
    pub max_stack: u32,
    /// Maximum quantity across a whole container
    pub max_quantity: u32,
    /// Whether the item can be used
    pub usable: bool,
    /// Whether using the item consumes it
    pub consumable: bool,
    /// Quantity removed per successful use
    pub consume_quantity: u32,
    /// Whether the item can be equipped
    pub equippable: bool,
    /// Equipment container the item goes to when equipped
    pub equipment_target_container: String,
    /// Whether the item can be equipped into a full equipment container
    pub equippable_if_target_full: bool,
    /// Whether equipping removes the item from its source container
    pub move_to_equipment_on_equip: bool,
    /// Whether the item can be dropped
    pub droppable: bool,
    /// Whether the item can leave its slot
    pub movable: bool,
    /// Whether the item can trade places with another item
    pub swappable: bool,
    /// Fixed slot the item is always placed in
    pub forced_slot: Option<usize>,
}

impl ItemDefinition {
    /// Create a new item definition
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            target_container: DEFAULT_TARGET_CONTAINER.to_string(),
            max_stack: 1,
            max_quantity: 1,
            usable: false,
            consumable: false,
            consume_quantity: 1,
            equippable: false,
            equipment_target_container: String::new(),
            equippable_if_target_full: false,
            move_to_equipment_on_equip: true,
            droppable: true,
            movable: true,
            swappable: true,
            forced_slot: None,
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set icon path
    pub fn with_icon(mut self, path: impl Into<String>) -> Self {
        self.icon = path.into();
        self
    }

    /// Set target container name
    pub fn with_target_container(mut self, name: impl Into<String>) -> Self {
        self.target_container = name.into();
        self
    }

    /// Set max stack size
    pub fn with_max_stack(mut self, max: u32) -> Self {
        self.max_stack = max.max(1);
        self
    }

    /// Set max quantity per container
    pub fn with_max_quantity(mut self, max: u32) -> Self {
        self.max_quantity = max.max(1);
        self
    }

    /// Set usable
    pub fn with_usable(mut self, usable: bool) -> Self {
        self.usable = usable;
        self
    }

    /// Make usable and consumed by `quantity` per use
    pub fn consumable(mut self, quantity: u32) -> Self {
        self.usable = true;
        self.consumable = true;
        self.consume_quantity = quantity;
        self
    }

    /// Make equippable into the named equipment container
    pub fn equippable(mut self, equipment_container: impl Into<String>) -> Self {
        self.equippable = true;
        self.equipment_target_container = equipment_container.into();
        self
    }

    /// Allow equipping into a full equipment container
    pub fn with_equippable_if_target_full(mut self, allowed: bool) -> Self {
        self.equippable_if_target_full = allowed;
        self
    }

    /// Set whether equipping removes the item from its source
    pub fn with_move_on_equip(mut self, moves: bool) -> Self {
        self.move_to_equipment_on_equip = moves;
        self
    }

    /// Make non-droppable
    pub fn non_droppable(mut self) -> Self {
        self.droppable = false;
        self
    }

    /// Make non-movable
    pub fn non_movable(mut self) -> Self {
        self.movable = false;
        self
    }

    /// Make non-swappable
    pub fn non_swappable(mut self) -> Self {
        self.swappable = false;
        self
    }

    /// Always place this item in the given slot
    pub fn with_forced_slot(mut self, index: usize) -> Self {
        self.forced_slot = Some(index);
        self
    }

    /// Check if stackable
    pub fn is_stackable(&self) -> bool {
        self.max_stack > 1
    }

    /// Check if this definition describes no item
    pub fn is_null(&self) -> bool {
        self.id.is_empty()
    }
}

impl Default for ItemDefinition {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// A runtime copy of an item definition held in a slot
#[derive(Clone)]
pub struct ItemInstance {
    /// Shared definition
    pub definition: Arc<ItemDefinition>,
    /// Quantity held
    pub quantity: u32,
    /// Scripted behaviour for this item kind
    pub effects: SharedEffects,
}

impl ItemInstance {
    /// Copy a definition into a new instance holding one item
    pub fn copy(definition: &Arc<ItemDefinition>) -> Self {
        Self {
            definition: Arc::clone(definition),
            quantity: 1,
            effects: no_effects(),
        }
    }

    /// Create an instance from an owned definition
    pub fn from_definition(definition: ItemDefinition) -> Self {
        Self::copy(&Arc::new(definition))
    }

    /// Set quantity
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Attach effects
    pub fn with_effects(mut self, effects: SharedEffects) -> Self {
        self.effects = effects;
        self
    }

    /// Item id
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Whether both instances hold the same kind of item
    pub fn same_kind(&self, other: &ItemInstance) -> bool {
        self.definition.id == other.definition.id
    }

    /// Copy of this instance carrying a different quantity
    pub(crate) fn split_off(&self, quantity: u32) -> ItemInstance {
        ItemInstance {
            definition: Arc::clone(&self.definition),
            quantity,
            effects: Arc::clone(&self.effects),
        }
    }
}

impl fmt::Debug for ItemInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemInstance")
            .field("id", &self.definition.id)
            .field("quantity", &self.quantity)
            .field("effects", &EffectsDebug(&self.effects))
            .finish()
    }
}

/// Check whether an item is the null item.
///
/// An absent instance, an instance with an empty id and an instance with
/// zero quantity are all the null item; a slot holding one is empty.
pub fn is_null(item: Option<&ItemInstance>) -> bool {
    match item {
        None => true,
        Some(item) => item.definition.is_null() || item.quantity == 0,
    }
}
