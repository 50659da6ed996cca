//! Write-once shared slot.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::error::PluginError;

/// Holds at most one value for the process lifetime.
///
/// The single write is a compare-and-swap against the empty state, so a
/// second `set` fails even when two writers race. Reads are lock-free.
pub struct SetOnce<T> {
    cell: ArcSwapOption<T>,
}

impl<T> SetOnce<T> {
    pub fn new() -> Self {
        Self {
            cell: ArcSwapOption::empty(),
        }
    }

    /// Store `value`. Fails with `DoubleInitialization` if already set.
    pub fn set(&self, value: Arc<T>) -> Result<(), PluginError> {
        let previous = self.cell.compare_and_swap(&None::<Arc<T>>, Some(value));
        if previous.is_some() {
            return Err(PluginError::DoubleInitialization);
        }
        Ok(())
    }

    /// Read the stored value. Fails with `UninitializedState` before `set`.
    pub fn get(&self) -> Result<Arc<T>, PluginError> {
        self.cell.load_full().ok_or(PluginError::UninitializedState)
    }

    pub fn is_set(&self) -> bool {
        self.cell.load().is_some()
    }
}

impl<T> Default for SetOnce<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SetOnce<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetOnce").field("set", &self.is_set()).finish()
    }
}
