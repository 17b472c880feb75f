//! Invariant tests for void_inventory
//!
//! These tests drive long operation sequences across several containers
//! and check the slot and quantity invariants after every step.

use std::collections::HashMap;
use std::sync::Arc;
use void_inventory::prelude::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct World {
    registry: Arc<ContainerRegistry>,
    main: SharedContainer,
    chest: SharedContainer,
    weapon: SharedContainer,
    coordinator: EquipmentCoordinator,
}

fn world() -> World {
    let registry = Arc::new(ContainerRegistry::new());
    let main = registry
        .register(Container::new(ContainerConfig::main("MainInventory", 6)))
        .unwrap();
    let chest = registry
        .register(Container::new(ContainerConfig::main("Chest", 4)))
        .unwrap();
    let weapon = registry
        .register(Container::new(ContainerConfig::equipment("Weapon", 1)))
        .unwrap();

    let arrow = ItemInstance::from_definition(
        ItemDefinition::new("arrow", "Arrow").with_max_stack(10).with_max_quantity(30),
    );
    let sword = ItemInstance::from_definition(
        ItemDefinition::new("sword", "Sword")
            .equippable("Weapon")
            .with_equippable_if_target_full(true),
    );
    let bow = ItemInstance::from_definition(
        ItemDefinition::new("bow", "Bow")
            .equippable("Weapon")
            .with_equippable_if_target_full(true),
    );
    let potion = ItemInstance::from_definition(
        ItemDefinition::new("potion", "Potion").with_max_stack(4).with_max_quantity(8),
    );

    {
        let mut main = main.lock();
        main.add(&arrow, 25).unwrap();
        main.add(&sword, 1).unwrap();
        main.add(&bow, 1).unwrap();
        main.add(&potion, 3).unwrap();
    }

    let coordinator = EquipmentCoordinator::new(Arc::clone(&registry));
    World {
        registry,
        main,
        chest,
        weapon,
        coordinator,
    }
}

fn check_slots(container: &Container) {
    let mut totals: HashMap<&str, (u32, u32)> = HashMap::new();
    for (index, item) in container.items() {
        assert!(
            item.quantity >= 1 && item.quantity <= item.definition.max_stack,
            "slot {} of '{}' holds {} '{}'",
            index,
            container.name(),
            item.quantity,
            item.id()
        );
        let entry = totals.entry(item.id()).or_insert((0, item.definition.max_quantity));
        entry.0 += item.quantity;
    }
    for (item_id, (total, maximum)) in totals {
        assert!(total <= maximum, "'{}' holds {} '{}'", container.name(), total, item_id);
    }
}

fn check_all(world: &World) {
    for container in world.registry.containers() {
        check_slots(&container.lock());
    }
}

fn totals(world: &World) -> HashMap<&'static str, u32> {
    ["arrow", "sword", "bow", "potion"]
        .into_iter()
        .map(|id| (id, world.registry.total_quantity(id)))
        .collect()
}

/// INVARIANT: Stack bounds and per-item caps hold after every operation
#[test]
fn invariant_slots_stay_in_bounds() {
    init_logger();
    let mut world = world();
    check_all(&world);

    for i in 0..200usize {
        match i % 6 {
            0 => {
                let _ = world.main.lock().move_item(i % 6, (i * 7) % 6);
            }
            1 => {
                let mut main = world.main.lock();
                let mut chest = world.chest.lock();
                let _ = main.move_to_container((i / 6) % 6, &mut chest, None);
            }
            2 => {
                let mut chest = world.chest.lock();
                let mut main = world.main.lock();
                let _ = chest.move_to_container(i % 4, &mut main, None);
            }
            3 => {
                let _ = world.main.lock().swap((i / 3) % 6, (i / 5) % 6);
            }
            4 => {
                let key = world.main.lock().key();
                let _ = world.coordinator.equip(&key, (i / 4) % 6);
            }
            _ => {
                let key = world.weapon.lock().key();
                let _ = world.coordinator.unequip(&key, 0);
            }
        }
        check_all(&world);
    }
}

/// INVARIANT: Moves, transfers, equips and unequips never create items
#[test]
fn invariant_no_duplication() {
    init_logger();
    let mut world = world();
    let mut previous = totals(&world);

    for i in 0..200usize {
        match i % 4 {
            0 => {
                let _ = world.main.lock().move_item((i / 4) % 6, (i / 3) % 6);
            }
            1 => {
                let mut main = world.main.lock();
                let mut chest = world.chest.lock();
                let destination = if i % 3 == 0 { Some(i % 4) } else { None };
                let _ = main.move_to_container((i / 4) % 6, &mut chest, destination);
            }
            2 => {
                let key = world.main.lock().key();
                let _ = world.coordinator.equip(&key, (i / 2) % 6);
            }
            _ => {
                let key = world.weapon.lock().key();
                let _ = world.coordinator.unequip(&key, 0);
            }
        }

        let current = totals(&world);
        for (item_id, total) in &current {
            assert!(
                *total <= previous[item_id],
                "step {}: '{}' grew from {} to {}",
                i,
                item_id,
                previous[item_id],
                total
            );
        }
        previous = current;
    }
}

/// INVARIANT: Failed operations leave every slot untouched
#[test]
fn invariant_failed_operations_are_no_ops() {
    init_logger();
    let world = world();
    let mut main = world.main.lock();
    let before = SerializedContainer::capture(&main);

    assert!(main.remove(40, 1).is_err());
    assert!(main.remove_by_id("potion", 50).is_err());
    assert!(main.use_item(0).is_err());
    assert!(main.move_item(0, 3).is_err());
    let sword = main.slot(3).unwrap().clone();
    assert!(main.add_at(&sword, 1, 0).is_err());
    assert!(main.destroy(40).is_err());

    assert_eq!(SerializedContainer::capture(&main), before);
}

/// INVARIANT: Emptying twice is the same as emptying once
#[test]
fn invariant_empty_is_idempotent() {
    init_logger();
    let world = world();
    let mut main = world.main.lock();

    main.empty();
    let once = SerializedContainer::capture(&main);
    main.empty();

    assert_eq!(SerializedContainer::capture(&main), once);
    assert!(main.is_empty());
    assert_eq!(main.capacity(), 6);
}

/// INVARIANT: Unequip never destroys an item
#[test]
fn invariant_unequip_keeps_items_when_full() {
    init_logger();
    let mut world = world();
    let main_key = world.main.lock().key();
    world.coordinator.equip(&main_key, 3).unwrap();

    let filler = ItemInstance::from_definition(
        ItemDefinition::new("rock", "Rock").with_max_stack(10).with_max_quantity(10),
    );
    world.main.lock().add(&filler, 10).unwrap();
    assert!(world.main.lock().is_full());

    let events = world.coordinator.subscribe();
    let weapon_key = world.weapon.lock().key();
    world.coordinator.unequip(&weapon_key, 0).unwrap();

    assert!(world.weapon.lock().is_empty());
    let dropped: Vec<_> = events
        .try_iter()
        .filter(|event| event.kind == InventoryEventKind::Drop)
        .collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].item_id.as_deref(), Some("sword"));
    assert_eq!(world.registry.total_quantity("sword"), 0);
}
