//! In-memory slot storage.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::domain::ports::{SlotStorage, SlotStorageError};

/// Slots held in a process-local map.
#[derive(Debug, Default)]
pub struct MemorySlotStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl SlotStorage for MemorySlotStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SlotStorageError> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SlotStorageError> {
        self.slots.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SlotStorageError> {
        self.slots.lock().remove(key);
        Ok(())
    }
}
