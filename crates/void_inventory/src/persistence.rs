//! Save/load of container content

use crate::catalog::Catalog;
use crate::container::Container;
use crate::error::InventoryError;
use crate::events::{InventoryEvent, InventoryEventKind};
use crate::registry::{ContainerKey, ContainerRegistry};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Persistence errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    /// Nothing saved under a key
    #[error("No saved content for {0}")]
    NotFound(String),
    /// Key cannot be used as a file name
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
    /// Container operation failed
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

/// Blob encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveFormat {
    /// JSON (human readable)
    Json,
    /// Binary (compact)
    #[default]
    Binary,
}

/// Positional record of a container's slots.
///
/// Empty slots hold an empty id and a zero quantity. Only ids are stored;
/// everything else comes back from the catalog on load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SerializedContainer {
    /// Container name
    pub name: String,
    /// Owner id
    pub owner_id: String,
    /// Item id per slot
    pub item_ids: Vec<String>,
    /// Quantity per slot
    pub quantities: Vec<u32>,
}

impl SerializedContainer {
    /// Snapshot a container
    pub fn capture(container: &Container) -> Self {
        let (item_ids, quantities) = container
            .slots()
            .iter()
            .map(|slot| match slot {
                Some(item) => (item.id().to_string(), item.quantity),
                None => (String::new(), 0),
            })
            .unzip();

        Self {
            name: container.name().to_string(),
            owner_id: container.owner_id().to_string(),
            item_ids,
            quantities,
        }
    }

    /// Number of recorded slots
    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    /// Check if no slot was recorded
    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }
}

/// Key/value store for encoded containers
pub trait BlobStore: Send + Sync {
    /// Store a blob, replacing any previous one
    fn save(&self, key: &str, blob: &[u8]) -> PersistenceResult<()>;

    /// Fetch a blob
    fn load(&self, key: &str) -> PersistenceResult<Option<Vec<u8>>>;

    /// Remove a blob; removing a missing key is not an error
    fn delete(&self, key: &str) -> PersistenceResult<()>;
}

/// Blob store kept in memory
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Check if the store holds nothing
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl BlobStore for MemoryBlobStore {
    fn save(&self, key: &str, blob: &[u8]) -> PersistenceResult<()> {
        self.blobs.write().insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> PersistenceResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(key).cloned())
    }

    fn delete(&self, key: &str) -> PersistenceResult<()> {
        self.blobs.write().remove(key);
        Ok(())
    }
}

/// Blob store writing one file per key into a directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// File extension of stored blobs
    pub const EXTENSION: &'static str = "inventory";

    /// Create a store rooted at a directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory blobs are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a key is stored in; keys are limited to `[A-Za-z0-9_-]`
    fn path(&self, key: &str) -> PersistenceResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", key, Self::EXTENSION)))
    }
}

impl BlobStore for FileBlobStore {
    fn save(&self, key: &str, blob: &[u8]) -> PersistenceResult<()> {
        let path = self.path(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, blob)?;
        Ok(())
    }

    fn load(&self, key: &str) -> PersistenceResult<Option<Vec<u8>>> {
        let path = self.path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    fn delete(&self, key: &str) -> PersistenceResult<()> {
        let path = self.path(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Outcome of loading one container
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Number of slots restored with an item
    pub restored: usize,
    /// Slots whose id the catalog did not know, with that id
    pub unresolved: Vec<(usize, String)>,
}

impl LoadReport {
    /// Whether every saved id resolved
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Encodes containers to blobs and restores them against a catalog
pub struct PersistenceCodec {
    store: Arc<dyn BlobStore>,
    format: SaveFormat,
}

impl PersistenceCodec {
    /// Create a codec writing to a blob store
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            store,
            format: SaveFormat::default(),
        }
    }

    /// Set blob encoding
    pub fn with_format(mut self, format: SaveFormat) -> Self {
        self.format = format;
        self
    }

    /// Blob encoding in use
    pub fn format(&self) -> SaveFormat {
        self.format
    }

    /// Encode a container's content
    pub fn encode(&self, container: &Container) -> PersistenceResult<Vec<u8>> {
        let record = SerializedContainer::capture(container);
        match self.format {
            SaveFormat::Json => serde_json::to_vec_pretty(&record)
                .map_err(|e| PersistenceError::Serialization(e.to_string())),
            SaveFormat::Binary => bincode::serialize(&record)
                .map_err(|e| PersistenceError::Serialization(e.to_string())),
        }
    }

    /// Decode a blob produced by [`PersistenceCodec::encode`]
    pub fn decode(&self, blob: &[u8]) -> PersistenceResult<SerializedContainer> {
        let record: SerializedContainer = match self.format {
            SaveFormat::Json => serde_json::from_slice(blob)
                .map_err(|e| PersistenceError::Deserialization(e.to_string()))?,
            SaveFormat::Binary => bincode::deserialize(blob)
                .map_err(|e| PersistenceError::Deserialization(e.to_string()))?,
        };

        if record.item_ids.len() != record.quantities.len() {
            return Err(PersistenceError::Deserialization(format!(
                "{} ids but {} quantities",
                record.item_ids.len(),
                record.quantities.len()
            )));
        }
        Ok(record)
    }

    /// Save a container under its name and owner
    pub fn save(&self, container: &Container) -> PersistenceResult<()> {
        let blob = self.encode(container)?;
        let key = container.key().storage_key();
        self.store.save(&key, &blob)?;
        log::debug!("Saved '{}' ({} bytes)", key, blob.len());
        Ok(())
    }

    /// Restore a container from its saved blob.
    ///
    /// Slots whose id the catalog cannot resolve are left empty and listed
    /// in the report; the rest of the container still loads.
    pub fn load(&self, container: &mut Container, catalog: &dyn Catalog) -> PersistenceResult<LoadReport> {
        let key = container.key().storage_key();
        let blob = self
            .store
            .load(&key)?
            .ok_or_else(|| PersistenceError::NotFound(key.clone()))?;
        let record = self.decode(&blob)?;
        Ok(Self::apply(&record, container, catalog))
    }

    /// Replace a container's slots with a decoded record
    pub fn apply(record: &SerializedContainer, container: &mut Container, catalog: &dyn Catalog) -> LoadReport {
        let mut report = LoadReport::default();
        let mut slots = Vec::with_capacity(record.len());

        for (index, (item_id, &quantity)) in record.item_ids.iter().zip(&record.quantities).enumerate() {
            if item_id.is_empty() || quantity == 0 {
                slots.push(None);
                continue;
            }
            match catalog.instantiate(item_id, quantity) {
                Some(item) => {
                    report.restored += 1;
                    slots.push(Some(item));
                }
                None => {
                    log::warn!(
                        "Unknown item '{}' in slot {} of '{}' ({})",
                        item_id,
                        index,
                        container.name(),
                        container.owner_id()
                    );
                    container.reject(InventoryError::UnresolvedCatalogEntry(item_id.clone()));
                    report.unresolved.push((index, item_id.clone()));
                    slots.push(None);
                }
            }
        }

        container.replace_slots(slots);
        let name = container.name().to_string();
        let owner_id = container.owner_id().to_string();
        container.emit(InventoryEvent::new(InventoryEventKind::InventoryLoaded, &name, &owner_id));
        container.emit(InventoryEvent::new(InventoryEventKind::ContentChanged, name, owner_id));
        report
    }

    /// Delete the saved content of a container
    pub fn reset(&self, key: &ContainerKey) -> PersistenceResult<()> {
        self.store.delete(&key.storage_key())
    }

    /// Save every persistent container of a registry; returns how many were saved
    pub fn save_registry(&self, registry: &ContainerRegistry) -> PersistenceResult<usize> {
        let mut saved = 0;
        for key in registry.keys() {
            let Some(handle) = registry.get(&key) else {
                continue;
            };
            let container = handle.lock();
            if container.is_persistent() {
                self.save(&container)?;
                saved += 1;
            }
        }
        log::info!("Saved {} containers", saved);
        Ok(saved)
    }

    /// Load every persistent container that has saved content
    pub fn load_registry(
        &self,
        registry: &ContainerRegistry,
        catalog: &dyn Catalog,
    ) -> PersistenceResult<HashMap<ContainerKey, LoadReport>> {
        let mut reports = HashMap::new();
        for key in registry.keys() {
            let Some(handle) = registry.get(&key) else {
                continue;
            };
            let mut container = handle.lock();
            if !container.is_persistent() {
                continue;
            }
            match self.load(&mut container, catalog) {
                Ok(report) => {
                    reports.insert(key, report);
                }
                Err(PersistenceError::NotFound(_)) => {
                    log::debug!("No saved content for {}", key);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(reports)
    }
}
