//! Slot container

use crate::config::{ContainerConfig, ContainerKind};
use crate::error::{InventoryError, Permission, Result};
use crate::events::{EventDispatcher, InventoryEvent, InventoryEventKind};
use crate::item::{is_null, ItemDefinition, ItemInstance};
use crate::registry::ContainerKey;
use crossbeam_channel::Receiver;

/// Outcome of placing items into a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    /// Quantity the caller asked for
    pub requested: u32,
    /// Quantity left after the container-wide cap
    pub accepted: u32,
    /// Quantity that actually landed in slots
    pub placed: u32,
}

impl Placement {
    /// Whether everything left after capping was placed
    pub fn is_complete(&self) -> bool {
        self.placed == self.accepted
    }

    /// Quantity that fit under the cap but found no slot
    pub fn overflow(&self) -> u32 {
        self.accepted - self.placed
    }

    /// Quantity removed by the container-wide cap
    pub fn capped(&self) -> u32 {
        self.requested - self.accepted
    }
}

/// Fixed-capacity array of item slots.
///
/// Every occupied slot holds between 1 and `max_stack` items and the total
/// of any item id never exceeds its `max_quantity`. Failed operations leave
/// the slots untouched, emit an `Error` event and return the cause.
#[derive(Debug)]
pub struct Container {
    name: String,
    owner_id: String,
    kind: ContainerKind,
    slots: Vec<Option<ItemInstance>>,
    persistent: bool,
    drop_position: [f32; 3],
    open: bool,
    events: EventDispatcher,
}

impl Container {
    /// Create an empty container from a configuration
    pub fn new(config: ContainerConfig) -> Self {
        let mut slots = Vec::with_capacity(config.capacity);
        slots.resize_with(config.capacity, || None);
        Self {
            name: config.name,
            owner_id: config.owner_id,
            kind: config.kind,
            slots,
            persistent: config.persistent,
            drop_position: config.drop_position,
            open: false,
            events: EventDispatcher::new(),
        }
    }

    /// Container name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owner id
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Registry key of this container
    pub fn key(&self) -> ContainerKey {
        ContainerKey::new(self.name.clone(), self.owner_id.clone())
    }

    /// Container kind
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Check if this is an equipment container
    pub fn is_equipment(&self) -> bool {
        self.kind == ContainerKind::Equipment
    }

    /// Whether the container is saved with the registry
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Where dropped items spawn
    pub fn drop_position(&self) -> [f32; 3] {
        self.drop_position
    }

    /// Whether the UI has the container open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Subscribe to this container's events
    pub fn subscribe(&mut self) -> Receiver<InventoryEvent> {
        self.events.subscribe()
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Get slot contents
    pub fn slot(&self, index: usize) -> Option<&ItemInstance> {
        self.slots.get(index)?.as_ref()
    }

    /// All slots in order
    pub fn slots(&self) -> &[Option<ItemInstance>] {
        &self.slots
    }

    /// Occupied slots with their index
    pub fn items(&self) -> impl Iterator<Item = (usize, &ItemInstance)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|item| (i, item)))
    }

    /// Number of empty slots
    pub fn number_of_free_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Number of occupied slots
    pub fn number_of_filled_slots(&self) -> usize {
        self.capacity() - self.number_of_free_slots()
    }

    /// Check if no slot is free
    pub fn is_full(&self) -> bool {
        self.number_of_free_slots() == 0
    }

    /// Check if every slot is free
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Total quantity of an item across all slots
    pub fn quantity(&self, item_id: &str) -> u32 {
        self.items()
            .filter(|(_, item)| item.id() == item_id)
            .fold(0u32, |total, (_, item)| total.saturating_add(item.quantity))
    }

    /// Indices of all slots holding an item, in slot order
    pub fn find(&self, item_id: &str) -> Vec<usize> {
        self.items()
            .filter(|(_, item)| item.id() == item_id)
            .map(|(i, _)| i)
            .collect()
    }

    /// Check if any slot holds an item
    pub fn contains(&self, item_id: &str) -> bool {
        self.items().any(|(_, item)| item.id() == item_id)
    }

    /// Quantity of an item the container can still take under its cap
    pub fn cap_quantity(&self, definition: &ItemDefinition, requested: u32) -> u32 {
        let room = definition
            .max_quantity
            .saturating_sub(self.quantity(&definition.id));
        requested.min(room)
    }

    /// Room for an item across empty slots and partial stacks of it.
    ///
    /// Saturates at `u32::MAX`.
    pub fn number_of_stackable_slots(&self, item_id: &str, max_stack: u32) -> u32 {
        self.slots
            .iter()
            .map(|slot| match slot {
                None => max_stack,
                Some(item) if item.id() == item_id => max_stack.saturating_sub(item.quantity),
                Some(_) => 0,
            })
            .fold(0u32, u32::saturating_add)
    }

    /// Add items, filling partial stacks first and spilling into free slots.
    ///
    /// The quantity is first capped to the item's container-wide maximum.
    /// Whatever fits under the cap but finds no slot is dropped; the
    /// returned [`Placement`] reports it. Use [`Container::add_all`] when a
    /// partial add is not acceptable.
    pub fn add(&mut self, item: &ItemInstance, quantity: u32) -> Result<Placement> {
        if item.definition.is_null() {
            return Err(self.reject(InventoryError::NullItem));
        }

        let definition = &item.definition;
        let accepted = self.cap_quantity(definition, quantity);
        let mut placement = Placement {
            requested: quantity,
            accepted,
            placed: 0,
        };
        if accepted < quantity {
            log::debug!(
                "Capped '{}' from {} to {} in '{}'",
                definition.id,
                quantity,
                accepted,
                self.name
            );
        }
        if accepted == 0 {
            return Ok(placement);
        }

        let mut remaining = accepted;

        if definition.is_stackable() {
            for index in self.find(&definition.id) {
                if remaining == 0 {
                    break;
                }
                if let Some(existing) = self.slots[index].as_mut() {
                    let room = definition.max_stack.saturating_sub(existing.quantity);
                    let absorbed = room.min(remaining);
                    existing.quantity += absorbed;
                    remaining -= absorbed;
                }
            }
        }

        if remaining == accepted && self.is_full() {
            return Err(self.reject(InventoryError::CapacityExceeded {
                container: self.name.clone(),
                item_id: definition.id.clone(),
            }));
        }

        while remaining > 0 {
            let Some(index) = self.first_free_slot() else {
                break;
            };
            let amount = remaining.min(definition.max_stack);
            self.slots[index] = Some(item.split_off(amount));
            remaining -= amount;
        }

        placement.placed = accepted - remaining;
        if remaining > 0 {
            log::warn!(
                "Container '{}' full, dropped {} of '{}'",
                self.name,
                remaining,
                definition.id
            );
        }

        self.notify_changed(Some((definition.id.as_str(), placement.placed)), None);
        Ok(placement)
    }

    /// Add items only if the whole capped quantity fits
    pub fn add_all(&mut self, item: &ItemInstance, quantity: u32) -> Result<Placement> {
        if item.definition.is_null() {
            return Err(self.reject(InventoryError::NullItem));
        }

        let definition = &item.definition;
        let accepted = self.cap_quantity(definition, quantity);
        let room = self.number_of_stackable_slots(&definition.id, definition.max_stack);
        if room < accepted {
            return Err(self.reject(InventoryError::CapacityExceeded {
                container: self.name.clone(),
                item_id: definition.id.clone(),
            }));
        }

        self.add(item, quantity)
    }

    /// Add items to one specific slot without spilling into others
    pub fn add_at(&mut self, item: &ItemInstance, quantity: u32, index: usize) -> Result<Placement> {
        self.check_index(index)?;
        if item.definition.is_null() {
            return Err(self.reject(InventoryError::NullItem));
        }

        let definition = &item.definition;
        let accepted = self.cap_quantity(definition, quantity);

        let previous = match &self.slots[index] {
            None => 0,
            Some(existing) if existing.id() == definition.id && definition.is_stackable() => {
                existing.quantity
            }
            Some(_) => {
                return Err(self.reject(InventoryError::DestinationOccupied {
                    container: self.name.clone(),
                    index,
                }))
            }
        };

        let total = previous.saturating_add(accepted).min(definition.max_stack).max(previous);
        let placement = Placement {
            requested: quantity,
            accepted,
            placed: total - previous,
        };
        if placement.placed == 0 {
            return Ok(placement);
        }

        self.slots[index] = Some(item.split_off(total));
        self.notify_changed(Some((definition.id.as_str(), placement.placed)), Some(index));
        Ok(placement)
    }

    /// Remove a quantity from one slot, clearing it when nothing is left
    pub fn remove(&mut self, index: usize, quantity: u32) -> Result<()> {
        self.check_index(index)?;

        let Some(item) = self.slots[index].as_mut() else {
            return Err(self.reject(InventoryError::EmptySlot {
                container: self.name.clone(),
                index,
            }));
        };

        let removed = quantity.min(item.quantity);
        item.quantity -= removed;
        let item_id = item.id().to_string();
        if item.quantity == 0 {
            self.slots[index] = None;
        }

        self.notify_changed(Some((item_id.as_str(), removed)), Some(index));
        Ok(())
    }

    /// Remove a quantity of an item across its slots, in slot order.
    ///
    /// Fails without touching any slot when the container holds less than
    /// requested.
    pub fn remove_by_id(&mut self, item_id: &str, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Ok(());
        }

        let available = self.quantity(item_id);
        if available < quantity {
            return Err(self.reject(InventoryError::InsufficientQuantity {
                container: self.name.clone(),
                item_id: item_id.to_string(),
                requested: quantity,
                available,
            }));
        }

        let mut remaining = quantity;
        for index in self.find(item_id) {
            if remaining == 0 {
                break;
            }
            if let Some(item) = self.slots[index].as_mut() {
                let taken = remaining.min(item.quantity);
                item.quantity -= taken;
                remaining -= taken;
                if item.quantity == 0 {
                    self.slots[index] = None;
                }
            }
        }

        self.notify_changed(Some((item_id, quantity)), None);
        Ok(())
    }

    /// Clear a slot and return what it held
    pub fn destroy(&mut self, index: usize) -> Result<ItemInstance> {
        self.check_index(index)?;

        let Some(item) = self.slots[index].take() else {
            return Err(self.reject(InventoryError::EmptySlot {
                container: self.name.clone(),
                index,
            }));
        };

        self.emit(
            InventoryEvent::new(InventoryEventKind::Destroy, &self.name, &self.owner_id)
                .with_item(item.id(), item.quantity)
                .with_index(index),
        );
        self.notify_changed(None, Some(index));
        Ok(item)
    }

    /// Move an item to another slot.
    ///
    /// An empty destination receives the item. A destination holding the
    /// same item trades places with the source when both are swappable.
    /// Anything else is rejected.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;

        let source = self.occupied(from)?;
        if !source.definition.movable {
            let err = InventoryError::permission_denied(source.id(), Permission::Movable);
            return Err(self.reject(err));
        }
        if from == to {
            return Ok(());
        }

        match &self.slots[to] {
            None => {
                self.slots[to] = self.slots[from].take();
            }
            Some(destination) => {
                let err = if !source.definition.swappable {
                    Some(InventoryError::permission_denied(source.id(), Permission::Swappable))
                } else if !destination.definition.swappable {
                    Some(InventoryError::permission_denied(destination.id(), Permission::Swappable))
                } else if !destination.same_kind(&source) {
                    Some(InventoryError::DestinationOccupied {
                        container: self.name.clone(),
                        index: to,
                    })
                } else {
                    None
                };
                if let Some(err) = err {
                    return Err(self.reject(err));
                }
                self.slots.swap(from, to);
            }
        }

        self.notify_changed(None, Some(to));
        Ok(())
    }

    /// Exchange two slots holding any kind of item.
    ///
    /// Falls back to [`Container::move_item`] when the destination is empty.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_index(a)?;
        self.check_index(b)?;

        let first = self.occupied(a)?;
        let Some(second) = self.slots[b].as_ref() else {
            return self.move_item(a, b);
        };

        let denied = if !first.definition.movable {
            Some((first.id(), Permission::Movable))
        } else if !first.definition.swappable {
            Some((first.id(), Permission::Swappable))
        } else if !second.definition.swappable {
            Some((second.id(), Permission::Swappable))
        } else {
            None
        };
        if let Some((item_id, permission)) = denied {
            let err = InventoryError::permission_denied(item_id, permission);
            return Err(self.reject(err));
        }

        self.slots.swap(a, b);
        self.notify_changed(None, None);
        Ok(())
    }

    /// Move a slot's full contents into another container.
    ///
    /// With `destination` set the item goes to that exact slot, which must
    /// be empty. The source is reduced only by what the target accepted, so
    /// a partial transfer leaves the remainder in place.
    pub fn move_to_container(
        &mut self,
        from: usize,
        target: &mut Container,
        destination: Option<usize>,
    ) -> Result<Placement> {
        self.check_index(from)?;

        let moving = self.occupied(from)?;
        if !moving.definition.movable {
            let err = InventoryError::permission_denied(moving.id(), Permission::Movable);
            return Err(self.reject(err));
        }

        let placement = match destination {
            Some(index) => {
                target.check_index(index)?;
                if target.slots[index].is_some() {
                    let err = InventoryError::DestinationOccupied {
                        container: target.name.clone(),
                        index,
                    };
                    return Err(self.reject(err));
                }
                target.add_at(&moving, moving.quantity, index)?
            }
            None => target.add(&moving, moving.quantity)?,
        };

        if placement.placed > 0 {
            self.remove(from, placement.placed)?;
        }
        if !placement.is_complete() || placement.capped() > 0 {
            log::debug!(
                "Moved {} of {} '{}' from '{}' to '{}'",
                placement.placed,
                moving.quantity,
                moving.id(),
                self.name,
                target.name
            );
        }
        Ok(placement)
    }

    /// Use the item in a slot, consuming it if the item is consumable
    pub fn use_item(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;

        let item = self.occupied(index)?;
        if !item.definition.usable {
            let err = InventoryError::permission_denied(item.id(), Permission::Usable);
            return Err(self.reject(err));
        }

        if !item.effects.on_use(&self.owner_id) {
            return Err(self.reject(InventoryError::EffectRejected(item.id().to_string())));
        }

        let consumed = if item.definition.consumable && item.definition.consume_quantity > 0 {
            self.remove(index, item.definition.consume_quantity)?;
            item.definition.consume_quantity.min(item.quantity)
        } else {
            0
        };

        self.emit(
            InventoryEvent::new(InventoryEventKind::ItemUsed, &self.name, &self.owner_id)
                .with_item(item.id(), consumed)
                .with_index(index),
        );
        Ok(())
    }

    /// Use an item by id, picking its last stack
    pub fn use_item_by_id(&mut self, item_id: &str) -> Result<()> {
        match self.find(item_id).last() {
            Some(&index) => self.use_item(index),
            None => Err(self.reject(InventoryError::InsufficientQuantity {
                container: self.name.clone(),
                item_id: item_id.to_string(),
                requested: 1,
                available: 0,
            })),
        }
    }

    /// Clear every slot
    pub fn empty(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.notify_changed(None, None);
    }

    /// Change the number of slots, keeping the contents of surviving slots
    pub fn resize(&mut self, capacity: usize) {
        let lost = self.slots.iter().skip(capacity).filter(|s| s.is_some()).count();
        if lost > 0 {
            log::warn!(
                "Resizing '{}' to {} slots discards {} occupied slots",
                self.name,
                capacity,
                lost
            );
        }
        self.slots.resize_with(capacity, || None);
        self.notify_changed(None, None);
    }

    /// Mark the container open or closed in the UI
    pub fn set_open(&mut self, open: bool) {
        if self.open == open {
            return;
        }
        self.open = open;
        let kind = if open {
            InventoryEventKind::InventoryOpened
        } else {
            InventoryEventKind::InventoryClosed
        };
        self.emit(InventoryEvent::new(kind, &self.name, &self.owner_id));
    }

    /// Send an event to this container's subscribers
    pub(crate) fn emit(&mut self, event: InventoryEvent) {
        self.events.emit(event);
    }

    /// Item in a slot, failing on a bad index or an empty slot
    pub(crate) fn checked_item(&mut self, index: usize) -> Result<ItemInstance> {
        self.check_index(index)?;
        self.occupied(index)
    }

    /// Put an item back into the slot it was just taken from
    pub(crate) fn restore_slot(&mut self, index: usize, item: ItemInstance) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(item);
            self.notify_changed(None, Some(index));
        }
    }

    /// Clear a slot as part of a transfer
    pub(crate) fn take_slot(&mut self, index: usize) -> Option<ItemInstance> {
        let item = self.slots.get_mut(index)?.take();
        if item.is_some() {
            self.notify_changed(None, Some(index));
        }
        item
    }

    /// Replace every slot at once, as a load does
    pub(crate) fn replace_slots(&mut self, slots: Vec<Option<ItemInstance>>) {
        self.slots = slots
            .into_iter()
            .map(|slot| slot.filter(|item| !is_null(Some(item))))
            .collect();
    }

    /// Log, broadcast and return an error
    pub(crate) fn reject(&mut self, error: InventoryError) -> InventoryError {
        log::debug!("Container '{}' ({}): {}", self.name, self.owner_id, error);
        let event = InventoryEvent::error(&self.name, &self.owner_id, error.clone());
        self.events.emit(event);
        error
    }

    fn check_index(&mut self, index: usize) -> Result<()> {
        if index < self.slots.len() {
            return Ok(());
        }
        let err = InventoryError::InvalidIndex {
            container: self.name.clone(),
            index,
            capacity: self.slots.len(),
        };
        Err(self.reject(err))
    }

    fn occupied(&mut self, index: usize) -> Result<ItemInstance> {
        match &self.slots[index] {
            Some(item) => Ok(item.clone()),
            None => {
                let err = InventoryError::EmptySlot {
                    container: self.name.clone(),
                    index,
                };
                Err(self.reject(err))
            }
        }
    }

    fn first_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_none())
    }

    fn notify_changed(&mut self, item: Option<(&str, u32)>, index: Option<usize>) {
        let mut event =
            InventoryEvent::new(InventoryEventKind::ContentChanged, &self.name, &self.owner_id);
        if let Some((item_id, quantity)) = item {
            event = event.with_item(item_id, quantity);
        }
        event.index = index;
        self.events.emit(event);
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}
