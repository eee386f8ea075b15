mod sqlite;

pub use sqlite::SqliteStore;

use crate::errors::{AppError, AppResult};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// String key / string value storage with the semantics of a browser's local
/// storage area: whole-value reads and writes, no transactions.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
    fn keys(&self) -> AppResult<Vec<String>>;
}

/// In-process store. An optional byte quota (keys plus values) makes writes
/// fail the way a full browser storage area does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.lock()?;
        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            if used + key.len() + value.len() > quota {
                return Err(AppError::Storage(format!(
                    "quota of {} bytes exceeded writing '{}'",
                    quota, key
                )));
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> AppResult<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// Stand-in for a context with no persistent storage at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl UnavailableStore {
    fn unavailable<T>() -> AppResult<T> {
        Err(AppError::Storage("storage is not available in this context".to_string()))
    }
}

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Self::unavailable()
    }

    fn set(&self, _key: &str, _value: &str) -> AppResult<()> {
        Self::unavailable()
    }

    fn remove(&self, _key: &str) -> AppResult<()> {
        Self::unavailable()
    }

    fn keys(&self) -> AppResult<Vec<String>> {
        Self::unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, MemoryStore, UnavailableStore};

    #[test]
    fn memory_store_overwrites_and_removes() {
        let store = MemoryStore::new();
        store.set("a", "1").expect("set");
        store.set("a", "2").expect("overwrite");
        store.set("b", "3").expect("set");
        assert_eq!(store.get("a").expect("get").as_deref(), Some("2"));
        assert_eq!(store.keys().expect("keys"), vec!["a", "b"]);

        store.remove("a").expect("remove");
        assert!(store.get("a").expect("get").is_none());
    }

    #[test]
    fn quota_rejects_oversized_writes_but_allows_replacing_in_place() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345").expect("fits");
        store.set("k", "123456789").expect("replacement fits");
        let err = store.set("other", "x").expect_err("over quota");
        assert!(err.to_string().contains("STORAGE_FAILURE"));
    }

    #[test]
    fn unavailable_store_fails_every_call() {
        let store = UnavailableStore;
        assert!(store.get("k").is_err());
        assert!(store.set("k", "v").is_err());
        assert!(store.keys().is_err());
    }
}
