//! World pickups feeding containers

use crate::error::{InventoryError, Result};
use crate::item::ItemInstance;
use crate::registry::ContainerRegistry;

/// An item lying in the world that can be picked into a container.
///
/// The item goes to its `target_container` under the picking owner.
/// A pickup may be taken in several goes when the container only has room
/// for part of it.
#[derive(Debug, Clone)]
pub struct ItemPicker {
    /// Item to pick up
    pub item: ItemInstance,
    /// Quantity the pickup started with
    pub quantity: u32,
    /// Pickup radius
    pub radius: f32,
    /// Allow picking when the container has no empty slot
    pub pickable_if_full: bool,
    /// Disable the pickup once nothing is left
    pub disable_when_depleted: bool,
    remaining: u32,
    enabled: bool,
}

impl ItemPicker {
    /// Create a pickup holding `quantity` of an item
    pub fn new(item: ItemInstance, quantity: u32) -> Self {
        Self {
            item,
            quantity,
            radius: 1.0,
            pickable_if_full: false,
            disable_when_depleted: true,
            remaining: quantity,
            enabled: true,
        }
    }

    /// Set pickup radius
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Allow topping up existing stacks when the container is full
    pub fn with_pickable_if_full(mut self, pickable: bool) -> Self {
        self.pickable_if_full = pickable;
        self
    }

    /// Keep the pickup enabled after it runs out
    pub fn with_disable_when_depleted(mut self, disable: bool) -> Self {
        self.disable_when_depleted = disable;
        self
    }

    /// Quantity still lying in the world
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Check if nothing is left to pick
    pub fn is_depleted(&self) -> bool {
        self.remaining == 0
    }

    /// Check if the pickup can be picked
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check if a picker is within range of the pickup
    pub fn in_range(&self, pickup_pos: [f32; 3], picker_pos: [f32; 3]) -> bool {
        let dx = picker_pos[0] - pickup_pos[0];
        let dy = picker_pos[1] - pickup_pos[1];
        let dz = picker_pos[2] - pickup_pos[2];
        let dist_sq = dx * dx + dy * dy + dz * dz;
        dist_sq <= self.radius * self.radius
    }

    /// Pick as much as the owner's target container can take.
    ///
    /// Returns the quantity moved into the container.
    pub fn pick(&mut self, registry: &ContainerRegistry, owner_id: &str) -> Result<u32> {
        if !self.enabled || self.is_depleted() {
            return Ok(0);
        }

        let definition = &self.item.definition;
        let handle = registry
            .resolve(&definition.target_container, owner_id)
            .ok_or_else(|| InventoryError::container_not_found(&definition.target_container, owner_id))?;
        let mut container = handle.lock();

        let room = container.number_of_stackable_slots(&definition.id, definition.max_stack);
        if container.is_full() && (room == 0 || !self.pickable_if_full) {
            let err = InventoryError::CapacityExceeded {
                container: container.name().to_string(),
                item_id: definition.id.clone(),
            };
            return Err(container.reject(err));
        }

        let amount = self.remaining.min(room);
        if amount == 0 {
            return Ok(0);
        }

        let placement = match definition.forced_slot {
            Some(index) => container.add_at(&self.item, amount, index)?,
            None => container.add(&self.item, amount)?,
        };

        self.remaining -= placement.placed;
        log::debug!(
            "Picked {} '{}' into '{}' ({}), {} left",
            placement.placed,
            definition.id,
            container.name(),
            owner_id,
            self.remaining
        );

        if self.is_depleted() && self.disable_when_depleted {
            self.enabled = false;
        }
        Ok(placement.placed)
    }

    /// Refill the pickup and enable it again
    pub fn reset(&mut self) {
        self.remaining = self.quantity;
        self.enabled = true;
    }
}
