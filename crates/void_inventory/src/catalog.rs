//! Item catalog

use crate::effects::SharedEffects;
use crate::item::{ItemDefinition, ItemInstance};
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only source of item definitions.
///
/// A host fills a catalog at startup from whatever medium it prefers and
/// hands it to the engine; containers resolve saved ids through it.
pub trait Catalog: Send + Sync {
    /// Look up a definition by item id
    fn lookup(&self, item_id: &str) -> Option<Arc<ItemDefinition>>;

    /// Effects attached to an item kind
    fn effects(&self, _item_id: &str) -> Option<SharedEffects> {
        None
    }

    /// Create an instance of an item with the given quantity
    fn instantiate(&self, item_id: &str, quantity: u32) -> Option<ItemInstance> {
        let definition = self.lookup(item_id)?;
        let mut item = ItemInstance::copy(&definition).with_quantity(quantity);
        if let Some(effects) = self.effects(item_id) {
            item.effects = effects;
        }
        Some(item)
    }
}

/// In-memory catalog keyed by item id
#[derive(Default)]
pub struct ItemCatalog {
    definitions: HashMap<String, Arc<ItemDefinition>>,
    effects: HashMap<String, SharedEffects>,
}

impl ItemCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of definitions
    pub fn from_definitions(definitions: impl IntoIterator<Item = ItemDefinition>) -> Self {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.register(definition);
        }
        catalog
    }

    /// Build a catalog from a JSON array of definitions
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let definitions: Vec<ItemDefinition> = serde_json::from_str(json)?;
        Ok(Self::from_definitions(definitions))
    }

    /// Register a definition, replacing any previous one with the same id
    pub fn register(&mut self, mut definition: ItemDefinition) -> Arc<ItemDefinition> {
        if definition.is_null() {
            log::warn!("Ignoring item definition with empty id ('{}')", definition.name);
            return Arc::new(definition);
        }
        definition.max_stack = definition.max_stack.max(1);
        definition.max_quantity = definition.max_quantity.max(1);

        let definition = Arc::new(definition);
        if self
            .definitions
            .insert(definition.id.clone(), Arc::clone(&definition))
            .is_some()
        {
            log::warn!("Replaced catalog entry '{}'", definition.id);
        }
        definition
    }

    /// Register a definition together with its effects
    pub fn register_with_effects(
        &mut self,
        definition: ItemDefinition,
        effects: SharedEffects,
    ) -> Arc<ItemDefinition> {
        let definition = self.register(definition);
        if !definition.is_null() {
            self.effects.insert(definition.id.clone(), effects);
        }
        definition
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the catalog has no definitions
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Iterate over registered ids
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}

impl Catalog for ItemCatalog {
    fn lookup(&self, item_id: &str) -> Option<Arc<ItemDefinition>> {
        self.definitions.get(item_id).cloned()
    }

    fn effects(&self, item_id: &str) -> Option<SharedEffects> {
        self.effects.get(item_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ItemEffects;

    struct Refuses;

    impl ItemEffects for Refuses {
        fn on_use(&self, _owner_id: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = ItemCatalog::from_definitions([
            ItemDefinition::new("coin", "Coin").with_max_stack(99),
            ItemDefinition::new("sword", "Sword"),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("coin").unwrap().max_stack, 99);
        assert!(catalog.lookup("shield").is_none());
    }

    #[test]
    fn test_empty_id_ignored() {
        let mut catalog = ItemCatalog::new();
        catalog.register(ItemDefinition::default());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_instantiate_carries_effects() {
        let mut catalog = ItemCatalog::new();
        catalog.register_with_effects(
            ItemDefinition::new("cursed_ring", "Cursed Ring").with_usable(true),
            Arc::new(Refuses),
        );

        let ring = catalog.instantiate("cursed_ring", 1).unwrap();
        assert!(!ring.effects.on_use("Player1"));
        assert!(catalog.instantiate("missing", 1).is_none());
    }

    #[test]
    fn test_from_json() {
        let catalog = ItemCatalog::from_json(
            r#"[
                { "id": "apple", "name": "Apple", "max_stack": 0, "max_quantity": 20 },
                { "id": "bow", "name": "Bow", "equippable": true, "equipment_target_container": "Weapon" }
            ]"#,
        )
        .unwrap();

        let apple = catalog.lookup("apple").unwrap();
        assert_eq!(apple.max_stack, 1);
        assert_eq!(apple.max_quantity, 20);
        assert!(catalog.lookup("bow").unwrap().equippable);

        let mut ids: Vec<_> = catalog.ids().collect();
        ids.sort();
        assert_eq!(ids, vec!["apple", "bow"]);
    }
}
