//! Equip, unequip and drop transfers between containers

use crate::container::Container;
use crate::error::{InventoryError, Permission, Result};
use crate::events::{EventDispatcher, InventoryEvent, InventoryEventKind};
use crate::item::ItemInstance;
use crate::registry::{ContainerKey, ContainerRegistry};
use crossbeam_channel::Receiver;
use std::sync::Arc;

/// Handle to a pickup object spawned in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickupHandle(pub u64);

/// Turns a dropped item into a world object
pub trait PickupSpawner: Send + Sync {
    /// Spawn a pickup holding `quantity` of `item_id` at `position`
    fn spawn_pickup(&self, item_id: &str, quantity: u32, position: [f32; 3]) -> PickupHandle;
}

/// Moves items between standard containers and the equipment containers
/// they are bound to.
///
/// Targets are resolved by name through the registry under the owner of the
/// container the item comes from. Events are sent both to the containers
/// involved and to the coordinator's own subscribers.
pub struct EquipmentCoordinator {
    registry: Arc<ContainerRegistry>,
    spawner: Option<Arc<dyn PickupSpawner>>,
    events: EventDispatcher,
}

impl EquipmentCoordinator {
    /// Create a coordinator working on a registry
    pub fn new(registry: Arc<ContainerRegistry>) -> Self {
        Self {
            registry,
            spawner: None,
            events: EventDispatcher::new(),
        }
    }

    /// Set the collaborator that spawns dropped items
    pub fn with_spawner(mut self, spawner: Arc<dyn PickupSpawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Registry this coordinator resolves containers in
    pub fn registry(&self) -> &Arc<ContainerRegistry> {
        &self.registry
    }

    /// Subscribe to equip, unequip and drop events
    pub fn subscribe(&mut self) -> Receiver<InventoryEvent> {
        self.events.subscribe()
    }

    /// Equip the item in `index` of the `source` container.
    ///
    /// When the equipment container has a single slot holding another
    /// swappable item, that item is unequipped and sent back to `source`,
    /// or dropped if `source` cannot take it.
    pub fn equip(&mut self, source: &ContainerKey, index: usize) -> Result<()> {
        let source_handle = self.registry.require(source)?;
        let mut source = source_handle.lock();
        let item = source.checked_item(index)?;
        let definition = Arc::clone(&item.definition);
        let owner_id = source.owner_id().to_string();

        if !definition.equippable {
            let err = InventoryError::permission_denied(&definition.id, Permission::Equippable);
            return Err(source.reject(err));
        }
        let Some(target_handle) = self
            .registry
            .resolve(&definition.equipment_target_container, &owner_id)
        else {
            let err = InventoryError::container_not_found(&definition.equipment_target_container, &owner_id);
            return Err(source.reject(err));
        };
        if !definition.movable {
            let err = InventoryError::permission_denied(&definition.id, Permission::Movable);
            return Err(source.reject(err));
        }
        if Arc::ptr_eq(&source_handle, &target_handle) {
            let err = InventoryError::InvalidTarget(definition.equipment_target_container.clone());
            return Err(source.reject(err));
        }

        let mut target = target_handle.lock();
        if !target.is_equipment() {
            let err = InventoryError::InvalidTarget(target.name().to_string());
            return Err(source.reject(err));
        }
        if target.is_full() && !definition.equippable_if_target_full {
            let err = InventoryError::CapacityExceeded {
                container: target.name().to_string(),
                item_id: definition.id.clone(),
            };
            return Err(source.reject(err));
        }

        let displaced = match target.slot(0).cloned() {
            Some(occupant)
                if target.capacity() == 1
                    && !occupant.same_kind(&item)
                    && definition.swappable
                    && occupant.definition.movable
                    && occupant.definition.swappable =>
            {
                if !occupant.effects.on_unequip(&owner_id) {
                    let err = InventoryError::EffectRejected(occupant.id().to_string());
                    return Err(source.reject(err));
                }
                target.take_slot(0);
                let event = Self::event(InventoryEventKind::ItemUnequipped, &target, &occupant, Some(0));
                self.broadcast(&mut target, event);
                Some(occupant)
            }
            _ => None,
        };

        let placed = match target.add(&item, item.quantity) {
            Ok(placement) if placement.placed > 0 => placement.placed,
            outcome => {
                if let Some(occupant) = displaced {
                    target.restore_slot(0, occupant);
                }
                return Err(match outcome {
                    Err(err) => err,
                    Ok(_) => source.reject(InventoryError::QuantityCapExceeded {
                        container: target.name().to_string(),
                        item_id: definition.id.clone(),
                        maximum: definition.max_quantity,
                    }),
                });
            }
        };

        if definition.move_to_equipment_on_equip {
            source.remove(index, placed)?;
        }

        if let Some(occupant) = displaced {
            self.return_to(&mut source, occupant);
        }

        if !item.effects.on_equip(&owner_id) {
            log::warn!("Equip hook of '{}' refused for owner '{}'", definition.id, owner_id);
            return Ok(());
        }

        let mut event = Self::event(InventoryEventKind::ItemEquipped, &source, &item, Some(index));
        event.quantity = placed;
        self.broadcast(&mut source, event);
        Ok(())
    }

    /// Unequip the item in `index` of the `equipment` container.
    ///
    /// The item goes back to its target container. If that container cannot
    /// take it, whatever does not fit is dropped instead of destroyed.
    pub fn unequip(&mut self, equipment: &ContainerKey, index: usize) -> Result<()> {
        let equipment_handle = self.registry.require(equipment)?;
        let mut equipment = equipment_handle.lock();
        let item = equipment.checked_item(index)?;
        let owner_id = equipment.owner_id().to_string();

        if !equipment.is_equipment() {
            let err = InventoryError::InvalidTarget(equipment.name().to_string());
            return Err(equipment.reject(err));
        }

        let target_handle = self
            .registry
            .resolve(&item.definition.target_container, &owner_id);
        if let Some(handle) = &target_handle {
            if Arc::ptr_eq(handle, &equipment_handle) {
                let err = InventoryError::InvalidTarget(item.definition.target_container.clone());
                return Err(equipment.reject(err));
            }
        }

        if !item.effects.on_unequip(&owner_id) {
            return Err(equipment.reject(InventoryError::EffectRejected(item.id().to_string())));
        }
        let event = Self::event(InventoryEventKind::ItemUnequipped, &equipment, &item, Some(index));
        self.broadcast(&mut equipment, event);

        let placed = match &target_handle {
            Some(handle) => {
                let mut target = handle.lock();
                Self::insert(&mut target, &item)
            }
            None => {
                log::warn!(
                    "Target container '{}' of '{}' not registered for '{}'",
                    item.definition.target_container,
                    item.id(),
                    owner_id
                );
                0
            }
        };

        equipment.take_slot(index);
        let leftover = item.quantity - placed;
        if leftover > 0 {
            self.drop_to_world(&mut equipment, &item.split_off(leftover), Some(index));
        }
        Ok(())
    }

    /// Drop the item in `index` of a container into the world.
    ///
    /// Returns the spawned pickup when a spawner is set.
    pub fn drop_item(&mut self, key: &ContainerKey, index: usize) -> Result<Option<PickupHandle>> {
        let handle = self.registry.require(key)?;
        let mut container = handle.lock();
        let item = container.checked_item(index)?;
        let owner_id = container.owner_id().to_string();

        if !item.definition.droppable {
            let err = InventoryError::permission_denied(item.id(), Permission::Droppable);
            return Err(container.reject(err));
        }
        if !item.effects.on_drop(&owner_id) {
            return Err(container.reject(InventoryError::EffectRejected(item.id().to_string())));
        }
        if container.is_equipment() {
            if !item.effects.on_unequip(&owner_id) {
                return Err(container.reject(InventoryError::EffectRejected(item.id().to_string())));
            }
            let event = Self::event(InventoryEventKind::ItemUnequipped, &container, &item, Some(index));
            self.broadcast(&mut container, event);
        }

        container.take_slot(index);
        Ok(self.drop_to_world(&mut container, &item, Some(index)))
    }

    /// Put a displaced item back into the container it was equipped from
    fn return_to(&mut self, source: &mut Container, item: ItemInstance) {
        let placed = Self::insert(source, &item);
        let leftover = item.quantity - placed;
        if leftover > 0 {
            log::debug!(
                "'{}' has no room for {} displaced '{}'",
                source.name(),
                leftover,
                item.id()
            );
            self.drop_to_world(source, &item.split_off(leftover), None);
        }
    }

    /// Add an item at its forced slot or wherever it fits; returns the quantity placed
    fn insert(container: &mut Container, item: &ItemInstance) -> u32 {
        let outcome = match item.definition.forced_slot {
            Some(slot) => container.add_at(item, item.quantity, slot),
            None => container.add(item, item.quantity),
        };
        outcome.map(|placement| placement.placed).unwrap_or(0)
    }

    fn drop_to_world(
        &mut self,
        container: &mut Container,
        item: &ItemInstance,
        index: Option<usize>,
    ) -> Option<PickupHandle> {
        log::info!(
            "Dropping {} '{}' from '{}' ({})",
            item.quantity,
            item.id(),
            container.name(),
            container.owner_id()
        );
        let event = Self::event(InventoryEventKind::Drop, container, item, index);
        self.broadcast(container, event);

        self.spawner
            .as_ref()
            .map(|spawner| spawner.spawn_pickup(item.id(), item.quantity, container.drop_position()))
    }

    fn event(
        kind: InventoryEventKind,
        container: &Container,
        item: &ItemInstance,
        index: Option<usize>,
    ) -> InventoryEvent {
        let mut event = InventoryEvent::new(kind, container.name(), container.owner_id())
            .with_item(item.id(), item.quantity);
        event.index = index;
        event
    }

    fn broadcast(&mut self, container: &mut Container, event: InventoryEvent) {
        container.emit(event.clone());
        self.events.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerConfig;
    use crate::effects::ItemEffects;
    use crate::item::ItemDefinition;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct RecordingSpawner {
        spawned: Mutex<Vec<(String, u32, [f32; 3])>>,
    }

    impl PickupSpawner for RecordingSpawner {
        fn spawn_pickup(&self, item_id: &str, quantity: u32, position: [f32; 3]) -> PickupHandle {
            let mut spawned = self.spawned.lock();
            spawned.push((item_id.to_string(), quantity, position));
            PickupHandle(spawned.len() as u64)
        }
    }

    #[derive(Default)]
    struct CountingEffects {
        equips: AtomicU32,
        unequips: AtomicU32,
    }

    impl ItemEffects for CountingEffects {
        fn on_equip(&self, _owner_id: &str) -> bool {
            self.equips.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn on_unequip(&self, _owner_id: &str) -> bool {
            self.unequips.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn setup(main_capacity: usize, weapon_capacity: usize) -> (Arc<ContainerRegistry>, ContainerKey, ContainerKey) {
        let registry = Arc::new(ContainerRegistry::new());
        let main = registry
            .register(Container::new(
                ContainerConfig::main("MainInventory", main_capacity).with_drop_position([1.0, 0.0, 2.0]),
            ))
            .unwrap();
        let weapon = registry
            .register(Container::new(ContainerConfig::equipment("Weapon", weapon_capacity)))
            .unwrap();
        let main_key = main.lock().key();
        let weapon_key = weapon.lock().key();
        (registry, main_key, weapon_key)
    }

    fn weapon(id: &str) -> ItemInstance {
        ItemInstance::from_definition(
            ItemDefinition::new(id, id)
                .equippable("Weapon")
                .with_equippable_if_target_full(true),
        )
    }

    #[test]
    fn test_equip_moves_item() {
        let (registry, main, weapon_slot) = setup(4, 1);
        let effects = Arc::new(CountingEffects::default());
        let sword = weapon("sword").with_effects(effects.clone());
        registry.get(&main).unwrap().lock().add(&sword, 1).unwrap();

        let mut coordinator = EquipmentCoordinator::new(Arc::clone(&registry));
        let events = coordinator.subscribe();
        coordinator.equip(&main, 0).unwrap();

        assert!(registry.get(&main).unwrap().lock().is_empty());
        assert_eq!(
            registry.get(&weapon_slot).unwrap().lock().slot(0).unwrap().id(),
            "sword"
        );
        assert_eq!(effects.equips.load(Ordering::SeqCst), 1);
        assert_eq!(events.try_recv().unwrap().kind, InventoryEventKind::ItemEquipped);
    }

    struct Cursed;

    impl ItemEffects for Cursed {
        fn on_equip(&self, _owner_id: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_equip_hook_refusal_keeps_transfer() {
        let (registry, main, weapon_slot) = setup(4, 1);
        let sword = weapon("sword").with_effects(Arc::new(Cursed));
        registry.get(&main).unwrap().lock().add(&sword, 1).unwrap();

        let mut coordinator = EquipmentCoordinator::new(Arc::clone(&registry));
        let events = coordinator.subscribe();
        coordinator.equip(&main, 0).unwrap();

        assert!(registry.get(&main).unwrap().lock().is_empty());
        assert_eq!(
            registry.get(&weapon_slot).unwrap().lock().slot(0).unwrap().id(),
            "sword"
        );
        assert!(events
            .try_iter()
            .all(|event| event.kind != InventoryEventKind::ItemEquipped));
    }

    #[test]
    fn test_equip_keeps_source_copy() {
        let (registry, main, weapon_slot) = setup(4, 1);
        let torch = ItemInstance::from_definition(
            ItemDefinition::new("torch", "Torch")
                .equippable("Weapon")
                .with_move_on_equip(false),
        );
        registry.get(&main).unwrap().lock().add(&torch, 1).unwrap();

        EquipmentCoordinator::new(Arc::clone(&registry)).equip(&main, 0).unwrap();

        assert!(registry.get(&main).unwrap().lock().contains("torch"));
        assert!(registry.get(&weapon_slot).unwrap().lock().contains("torch"));
    }

    #[test]
    fn test_equip_rejections() {
        let (registry, main, _) = setup(4, 2);
        let shared = registry.get(&main).unwrap();
        shared
            .lock()
            .add(&ItemInstance::from_definition(ItemDefinition::new("apple", "Apple")), 1)
            .unwrap();
        shared
            .lock()
            .add(
                &ItemInstance::from_definition(ItemDefinition::new("staff", "Staff").equippable("Offhand")),
                1,
            )
            .unwrap();
        shared
            .lock()
            .add(
                &ItemInstance::from_definition(
                    ItemDefinition::new("anvil", "Anvil").equippable("Weapon").non_movable(),
                ),
                1,
            )
            .unwrap();

        let mut coordinator = EquipmentCoordinator::new(Arc::clone(&registry));
        assert!(matches!(
            coordinator.equip(&main, 0),
            Err(InventoryError::PermissionDenied { permission: Permission::Equippable, .. })
        ));
        assert!(matches!(
            coordinator.equip(&main, 1),
            Err(InventoryError::ContainerNotFound { .. })
        ));
        assert!(matches!(
            coordinator.equip(&main, 2),
            Err(InventoryError::PermissionDenied { permission: Permission::Movable, .. })
        ));
        assert!(matches!(
            coordinator.equip(&main, 3),
            Err(InventoryError::EmptySlot { .. })
        ));
        assert_eq!(shared.lock().number_of_filled_slots(), 3);
    }

    #[test]
    fn test_equip_rejected_when_target_full() {
        let (registry, main, weapon_slot) = setup(4, 1);
        let strict = ItemInstance::from_definition(ItemDefinition::new("dagger", "Dagger").equippable("Weapon"));
        registry.get(&weapon_slot).unwrap().lock().add(&weapon("axe"), 1).unwrap();
        registry.get(&main).unwrap().lock().add(&strict, 1).unwrap();

        let mut coordinator = EquipmentCoordinator::new(Arc::clone(&registry));
        assert!(matches!(
            coordinator.equip(&main, 0),
            Err(InventoryError::CapacityExceeded { .. })
        ));
        assert!(registry.get(&main).unwrap().lock().contains("dagger"));
        assert!(registry.get(&weapon_slot).unwrap().lock().contains("axe"));
    }

    #[test]
    fn test_equip_swaps_single_slot() {
        let (registry, main, weapon_slot) = setup(4, 1);
        let axe_effects = Arc::new(CountingEffects::default());
        registry
            .get(&weapon_slot)
            .unwrap()
            .lock()
            .add(&weapon("axe").with_effects(axe_effects.clone()), 1)
            .unwrap();
        registry.get(&main).unwrap().lock().add_at(&weapon("sword"), 1, 2).unwrap();

        let mut coordinator = EquipmentCoordinator::new(Arc::clone(&registry));
        coordinator.equip(&main, 2).unwrap();

        let main = registry.get(&main).unwrap();
        assert_eq!(main.lock().slot(0).unwrap().id(), "axe");
        assert!(main.lock().slot(2).is_none());
        assert_eq!(
            registry.get(&weapon_slot).unwrap().lock().slot(0).unwrap().id(),
            "sword"
        );
        assert_eq!(axe_effects.unequips.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unequip_returns_item() {
        let (registry, main, weapon_slot) = setup(4, 1);
        registry.get(&weapon_slot).unwrap().lock().add(&weapon("bow"), 1).unwrap();

        let mut coordinator = EquipmentCoordinator::new(Arc::clone(&registry));
        coordinator.unequip(&weapon_slot, 0).unwrap();

        assert!(registry.get(&weapon_slot).unwrap().lock().is_empty());
        assert!(registry.get(&main).unwrap().lock().contains("bow"));
    }

    #[test]
    fn test_unequip_drops_when_target_full() {
        let (registry, main, weapon_slot) = setup(1, 1);
        let spawner = Arc::new(RecordingSpawner::default());
        registry.get(&main).unwrap().lock().add(&weapon("club"), 1).unwrap();
        registry.get(&weapon_slot).unwrap().lock().add(&weapon("bow"), 1).unwrap();

        let mut coordinator = EquipmentCoordinator::new(Arc::clone(&registry)).with_spawner(spawner.clone());
        let events = coordinator.subscribe();
        coordinator.unequip(&weapon_slot, 0).unwrap();

        assert!(registry.get(&weapon_slot).unwrap().lock().is_empty());
        assert_eq!(spawner.spawned.lock().as_slice(), &[("bow".to_string(), 1, [0.0, 0.0, 0.0])]);
        let kinds: Vec<_> = events.try_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![InventoryEventKind::ItemUnequipped, InventoryEventKind::Drop]);
    }

    #[test]
    fn test_unequip_requires_equipment_container() {
        let (registry, main, _) = setup(2, 1);
        registry.get(&main).unwrap().lock().add(&weapon("bow"), 1).unwrap();

        let mut coordinator = EquipmentCoordinator::new(Arc::clone(&registry));
        assert!(matches!(
            coordinator.unequip(&main, 0),
            Err(InventoryError::InvalidTarget(_))
        ));
        assert!(registry.get(&main).unwrap().lock().contains("bow"));
    }

    #[test]
    fn test_drop_item() {
        let (registry, main, _) = setup(2, 1);
        let spawner = Arc::new(RecordingSpawner::default());
        let shared = registry.get(&main).unwrap();
        shared
            .lock()
            .add(
                &ItemInstance::from_definition(ItemDefinition::new("rock", "Rock").with_max_stack(5).with_max_quantity(5)),
                3,
            )
            .unwrap();
        shared
            .lock()
            .add(&ItemInstance::from_definition(ItemDefinition::new("key", "Key").non_droppable()), 1)
            .unwrap();

        let mut coordinator = EquipmentCoordinator::new(Arc::clone(&registry)).with_spawner(spawner.clone());
        let handle = coordinator.drop_item(&main, 0).unwrap();

        assert_eq!(handle, Some(PickupHandle(1)));
        assert_eq!(spawner.spawned.lock()[0], ("rock".to_string(), 3, [1.0, 0.0, 2.0]));
        assert!(!shared.lock().contains("rock"));
        assert!(matches!(
            coordinator.drop_item(&main, 1),
            Err(InventoryError::PermissionDenied { permission: Permission::Droppable, .. })
        ));
    }
}
