//! Inventory events and observer fan-out

use crate::error::InventoryError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Type of inventory event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InventoryEventKind {
    /// Slot contents changed
    ContentChanged,
    /// An item was used
    ItemUsed,
    /// An item was equipped
    ItemEquipped,
    /// An item was unequipped
    ItemUnequipped,
    /// An item left the container for the world
    Drop,
    /// An item was destroyed
    Destroy,
    /// An operation was rejected
    Error,
    /// The container was opened by the UI
    InventoryOpened,
    /// The container was closed by the UI
    InventoryClosed,
    /// The container content was restored from storage
    InventoryLoaded,
}

/// An inventory event
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryEvent {
    /// Type of event
    pub kind: InventoryEventKind,
    /// Name of the container the event concerns
    pub container: String,
    /// Owner of that container
    pub owner_id: String,
    /// Item involved, if any
    pub item_id: Option<String>,
    /// Quantity involved
    pub quantity: u32,
    /// Slot involved, if any
    pub index: Option<usize>,
    /// Cause of an `Error` event
    pub error: Option<InventoryError>,
}

impl InventoryEvent {
    /// Create an event with no item attached
    pub fn new(
        kind: InventoryEventKind,
        container: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            container: container.into(),
            owner_id: owner_id.into(),
            item_id: None,
            quantity: 0,
            index: None,
            error: None,
        }
    }

    /// Create an error event
    pub fn error(
        container: impl Into<String>,
        owner_id: impl Into<String>,
        error: InventoryError,
    ) -> Self {
        let index = error.index();
        Self {
            index,
            error: Some(error),
            ..Self::new(InventoryEventKind::Error, container, owner_id)
        }
    }

    /// Set item and quantity
    pub fn with_item(mut self, item_id: impl Into<String>, quantity: u32) -> Self {
        self.item_id = Some(item_id.into());
        self.quantity = quantity;
        self
    }

    /// Set slot index
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// Fans events out to every subscribed receiver.
///
/// Emitting never blocks and never fails: receivers that were dropped are
/// pruned on the next emit.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    subscribers: Vec<Sender<InventoryEvent>>,
}

impl EventDispatcher {
    /// Create a dispatcher with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events
    pub fn subscribe(&mut self) -> Receiver<InventoryEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Send an event to every subscriber
    pub fn emit(&mut self, event: InventoryEvent) {
        match self.subscribers.len() {
            0 => {}
            1 => {
                if self.subscribers[0].send(event).is_err() {
                    self.subscribers.clear();
                }
            }
            _ => self
                .subscribers
                .retain(|subscriber| subscriber.send(event.clone()).is_ok()),
        }
    }
}
