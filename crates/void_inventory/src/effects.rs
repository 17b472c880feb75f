//! Per-item scripted effects

use std::fmt;
use std::sync::Arc;

/// Behaviour hooks fired when an item is used, equipped, unequipped or dropped.
///
/// Each hook receives the owner id of the container the item lives in and
/// returns whether the action went through. Returning `false` aborts the
/// surrounding operation before any slot is touched.
pub trait ItemEffects: Send + Sync {
    /// Called when the item is used
    fn on_use(&self, _owner_id: &str) -> bool {
        true
    }

    /// Called after the item lands in an equipment container
    fn on_equip(&self, _owner_id: &str) -> bool {
        true
    }

    /// Called before the item leaves an equipment container
    fn on_unequip(&self, _owner_id: &str) -> bool {
        true
    }

    /// Called before the item is dropped to the world
    fn on_drop(&self, _owner_id: &str) -> bool {
        true
    }
}

/// Effects shared between every instance of an item kind
pub type SharedEffects = Arc<dyn ItemEffects>;

/// Effects of an item with no scripted behaviour
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffects;

impl ItemEffects for NoEffects {}

/// Shared handle to [`NoEffects`]
pub fn no_effects() -> SharedEffects {
    Arc::new(NoEffects)
}

/// Wrapper giving `Debug` to an effects handle
pub(crate) struct EffectsDebug<'a>(pub &'a SharedEffects);

impl fmt::Debug for EffectsDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemEffects@{:p}", Arc::as_ptr(self.0))
    }
}
