//! Container registry

use crate::container::Container;
use crate::error::{InventoryError, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A container shared between the registry and its callers
pub type SharedContainer = Arc<Mutex<Container>>;

/// Identifies a container by name and owner
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerKey {
    /// Container name
    pub name: String,
    /// Owner id
    pub owner_id: String,
}

impl ContainerKey {
    /// Create a key
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner_id: owner_id.into(),
        }
    }

    /// Key used by blob stores.
    ///
    /// Both parts are hex encoded so distinct keys never collide and the
    /// result is safe to use as a file name.
    pub fn storage_key(&self) -> String {
        format!("{}_{}", hex::encode(&self.name), hex::encode(&self.owner_id))
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.owner_id)
    }
}

/// Lookup table from name and owner to container.
///
/// Cross-container operations resolve their targets here. The map is
/// guarded by a single lock; each container carries its own mutex.
#[derive(Default)]
pub struct ContainerRegistry {
    containers: RwLock<HashMap<ContainerKey, SharedContainer>>,
}

impl ContainerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container and return the shared handle
    pub fn register(&self, container: Container) -> Result<SharedContainer> {
        let key = container.key();
        let mut containers = self.containers.write();
        if containers.contains_key(&key) {
            return Err(InventoryError::DuplicateContainer {
                name: key.name,
                owner_id: key.owner_id,
            });
        }

        let shared = Arc::new(Mutex::new(container));
        log::debug!("Registered container {}", key);
        containers.insert(key, Arc::clone(&shared));
        Ok(shared)
    }

    /// Remove a container from the registry
    pub fn deregister(&self, key: &ContainerKey) -> Option<SharedContainer> {
        let removed = self.containers.write().remove(key);
        if removed.is_some() {
            log::debug!("Deregistered container {}", key);
        }
        removed
    }

    /// Get a container by key
    pub fn get(&self, key: &ContainerKey) -> Option<SharedContainer> {
        self.containers.read().get(key).cloned()
    }

    /// Get a container by name and owner
    pub fn resolve(&self, name: &str, owner_id: &str) -> Option<SharedContainer> {
        self.get(&ContainerKey::new(name, owner_id))
    }

    /// Get a container by key, failing if it is not registered
    pub fn require(&self, key: &ContainerKey) -> Result<SharedContainer> {
        self.get(key)
            .ok_or_else(|| InventoryError::container_not_found(&key.name, &key.owner_id))
    }

    /// Check if a container is registered
    pub fn contains(&self, key: &ContainerKey) -> bool {
        self.containers.read().contains_key(key)
    }

    /// All registered keys, sorted
    pub fn keys(&self) -> Vec<ContainerKey> {
        let mut keys: Vec<_> = self.containers.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// All registered containers
    pub fn containers(&self) -> Vec<SharedContainer> {
        self.containers.read().values().cloned().collect()
    }

    /// Number of registered containers
    pub fn len(&self) -> usize {
        self.containers.read().len()
    }

    /// Check if no container is registered
    pub fn is_empty(&self) -> bool {
        self.containers.read().is_empty()
    }

    /// Total quantity of an item across every registered container
    pub fn total_quantity(&self, item_id: &str) -> u32 {
        self.containers()
            .iter()
            .map(|container| container.lock().quantity(item_id))
            .fold(0u32, u32::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerConfig;
    use crate::item::{ItemDefinition, ItemInstance};

    #[test]
    fn test_register_and_resolve() {
        let registry = ContainerRegistry::new();
        registry
            .register(Container::new(ContainerConfig::main("Main", 4)))
            .unwrap();
        registry
            .register(Container::new(ContainerConfig::main("Main", 4).with_owner("Player2")))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("Main", "Player1").is_some());
        assert!(registry.resolve("Main", "Player3").is_none());
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = ContainerRegistry::new();
        registry
            .register(Container::new(ContainerConfig::main("Main", 4)))
            .unwrap();

        let err = registry
            .register(Container::new(ContainerConfig::main("Main", 8)))
            .unwrap_err();
        assert!(matches!(err, InventoryError::DuplicateContainer { .. }));
        assert_eq!(registry.resolve("Main", "Player1").unwrap().lock().capacity(), 4);
    }

    #[test]
    fn test_deregister() {
        let registry = ContainerRegistry::new();
        let shared = registry
            .register(Container::new(ContainerConfig::main("Chest", 2)))
            .unwrap();
        let key = shared.lock().key();

        assert!(registry.deregister(&key).is_some());
        assert!(!registry.contains(&key));
        assert!(registry.is_empty());
        assert!(matches!(
            registry.require(&key),
            Err(InventoryError::ContainerNotFound { .. })
        ));
    }

    #[test]
    fn test_total_quantity() {
        let registry = ContainerRegistry::new();
        let coin = ItemInstance::from_definition(
            ItemDefinition::new("coin", "Coin").with_max_stack(100).with_max_quantity(500),
        );

        for name in ["Main", "Bank"] {
            let shared = registry
                .register(Container::new(ContainerConfig::main(name, 2)))
                .unwrap();
            shared.lock().add(&coin, 30).unwrap();
        }

        assert_eq!(registry.total_quantity("coin"), 60);
        assert_eq!(registry.keys()[0].name, "Bank");
    }

    #[test]
    fn test_total_quantity_saturates() {
        let registry = ContainerRegistry::new();
        let sand = ItemInstance::from_definition(
            ItemDefinition::new("sand", "Sand")
                .with_max_stack(u32::MAX)
                .with_max_quantity(u32::MAX),
        );

        for name in ["Main", "Bank"] {
            let shared = registry
                .register(Container::new(ContainerConfig::main(name, 1)))
                .unwrap();
            shared.lock().add(&sand, 3_000_000_000).unwrap();
        }

        assert_eq!(registry.total_quantity("sand"), u32::MAX);
    }

    #[test]
    fn test_storage_key() {
        let key = ContainerKey::new("Main", "Player1");
        assert_eq!(key.storage_key(), "4d61696e_506c6179657231");
        assert_eq!(key.to_string(), "Main (Player1)");
    }

    #[test]
    fn test_storage_keys_distinct() {
        let a = ContainerKey::new("A_B", "C").storage_key();
        let b = ContainerKey::new("A", "B_C").storage_key();
        assert_ne!(a, b);

        let nested = ContainerKey::new("../chest", "Player1").storage_key();
        assert!(nested.chars().all(|c| c.is_ascii_hexdigit() || c == '_'));
    }
}
