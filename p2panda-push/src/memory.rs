// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};

use crate::traits::KeyValueStore;

/// In-memory key-value store.
///
/// This does not persist data permamently, all changes are lost when the process ends. Use this
/// only in development or test contexts.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use crate::traits::KeyValueStore;

    use super::MemoryStore;

    #[test]
    fn overwrite_value() {
        let store = MemoryStore::new();
        assert_eq!(store.get("key").unwrap(), None);

        store.put("key", &[1, 2, 3]).unwrap();
        store.put("key", &[4]).unwrap();
        assert_eq!(store.get("key").unwrap(), Some(vec![4]));

        // Clones share the same state.
        let store_clone = store.clone();
        store_clone.put("other", &[5]).unwrap();
        assert_eq!(store.get("other").unwrap(), Some(vec![5]));
    }
}
