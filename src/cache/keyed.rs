//! Typed, namespaced view over a [`KvStore`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

use crate::cache::{CacheError, CacheResult, KvStore};

/// Typed cache for one namespace. Entries are stored as `"{prefix}:{key}"`.
pub struct KeyedCache<T> {
    store: KvStore,
    prefix: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for KeyedCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            prefix: self.prefix.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> KeyedCache<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: KvStore, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            _marker: PhantomData,
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    /// Fetch and deserialize an entry.
    ///
    /// A present but undecodable entry is an error, not a miss.
    pub fn get(&self, key: &str) -> CacheResult<Option<T>> {
        let storage_key = self.storage_key(key);
        match self.store.get(&storage_key) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| CacheError::Serialization {
                    key: storage_key,
                    source,
                }),
            None => Ok(None),
        }
    }

    pub fn set(&self, key: &str, item: &T) -> CacheResult<()> {
        let storage_key = self.storage_key(key);
        let value = serde_json::to_value(item).map_err(|source| CacheError::Serialization {
            key: storage_key.clone(),
            source,
        })?;
        self.store.set(storage_key, value);
        Ok(())
    }

    pub fn delete(&self, key: &str) -> bool {
        self.store.delete(&self.storage_key(key))
    }

    /// Number of entries in this namespace.
    pub fn len(&self) -> usize {
        self.store.count_prefix(&format!("{}:", self.prefix))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: u32,
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = KvStore::new(None);
        let wallets: KeyedCache<Entry> = KeyedCache::new(store.clone(), "wallet");
        let contracts: KeyedCache<Entry> = KeyedCache::new(store.clone(), "contract");

        wallets.set("1", &Entry { id: 7 }).unwrap();
        assert_eq!(wallets.get("1").unwrap(), Some(Entry { id: 7 }));
        assert_eq!(contracts.get("1").unwrap(), None);
        assert_eq!(store.get("wallet:1"), Some(json!({"id": 7})));
        assert_eq!(wallets.len(), 1);
        assert!(contracts.is_empty());
    }

    #[test]
    fn test_undecodable_entry_is_error() {
        let store = KvStore::new(None);
        store.set("wallet:1", json!("not an entry"));
        let wallets: KeyedCache<Entry> = KeyedCache::new(store, "wallet");
        assert!(matches!(
            wallets.get("1"),
            Err(CacheError::Serialization { .. })
        ));
    }

    #[test]
    fn test_delete() {
        let wallets: KeyedCache<Entry> = KeyedCache::new(KvStore::new(None), "wallet");
        wallets.set("1", &Entry { id: 1 }).unwrap();
        assert!(wallets.delete("1"));
        assert_eq!(wallets.get("1").unwrap(), None);
    }
}
