//! In-memory key-value slots.
//!
//! Clones share the same map, so a test can keep one handle to inspect or
//! break the storage while the store owns another.

use super::{KeyValueStorage, StorageError, StorageResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
struct MemoryState {
    entries: HashMap<String, String>,
    available: bool,
}

/// Shared-handle in-memory storage with an availability switch.
#[derive(Debug, Clone)]
pub struct MemoryKeyValueStorage {
    state: Rc<RefCell<MemoryState>>,
}

impl Default for MemoryKeyValueStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKeyValueStorage {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MemoryState {
                entries: HashMap::new(),
                available: true,
            })),
        }
    }

    /// Turns the backend on or off. While off, every call fails with
    /// `StorageError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    pub fn is_available(&self) -> bool {
        self.state.borrow().available
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StorageError::Unavailable(
                "memory storage switched off".to_string(),
            ))
        }
    }
}

impl KeyValueStorage for MemoryKeyValueStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.ensure_available()?;
        Ok(self.state.borrow().entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.ensure_available()?;
        self.state
            .borrow_mut()
            .entries
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.ensure_available()?;
        self.state.borrow_mut().entries.remove(key);
        Ok(())
    }
}
