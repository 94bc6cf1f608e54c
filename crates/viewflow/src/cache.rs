//! Durable Cache Adapter.
//!
//! A namespaced key → JSON store that survives reloads but stays private to
//! the session. The adapter is a stateless translator with a hard contract:
//! nothing below it may fail the caller. A corrupt or missing entry loads as
//! absent; a full or unavailable store makes writes silent no-ops. Both are
//! logged and nothing else.

use crate::error::CacheError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use viewflow_protocol::PersistedViewState;

/// Raw key/value backend. Values are JSON documents as text.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

/// In-memory store. Does not survive anything; used by tests and by hosts
/// that disable persistence.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::unavailable("cache lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::unavailable("cache lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::unavailable("cache lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON file per namespace under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileCacheStore {
    dir: PathBuf,
}

impl JsonFileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Namespaces are validated names, but never trust them as paths.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl CacheStore for JsonFileCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// The adapter the controller talks to. Cloneable; all clones share one
/// backend but screens never share a namespace.
#[derive(Clone)]
pub struct DurableCache {
    store: Arc<dyn CacheStore>,
}

impl DurableCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()))
    }

    /// Load the persisted state for a namespace.
    ///
    /// A store error or a decode failure is treated identically to absent.
    pub fn load(&self, namespace: &str) -> Option<PersistedViewState> {
        let raw = match self.store.get(namespace) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(namespace, %err, "cache read failed; treating as absent");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(err) => {
                warn!(namespace, %err, "cached state undecodable; treating as absent");
                None
            }
        }
    }

    /// Persist the state for a namespace. Best effort: failures are logged
    /// and swallowed, never surfaced.
    pub fn save(&self, namespace: &str, state: &PersistedViewState) {
        let raw = match serde_json::to_string(state) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(namespace, %err, "failed to encode view state for cache");
                return;
            }
        };
        if let Err(err) = self.store.set(namespace, &raw) {
            warn!(namespace, %err, "cache write failed; continuing without persistence");
        } else {
            debug!(namespace, "persisted view state");
        }
    }

    /// Remove the entry for a namespace. Same best-effort contract as save.
    pub fn clear(&self, namespace: &str) {
        if let Err(err) = self.store.remove(namespace) {
            warn!(namespace, %err, "cache clear failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewflow_protocol::{FilterValue, ViewQuery};

    fn sample_state() -> PersistedViewState {
        let mut query = ViewQuery::with_page_size(9);
        query.filters.set("status", FilterValue::text("active"));
        PersistedViewState {
            query,
            result: None,
            has_searched: true,
        }
    }

    #[test]
    fn memory_store_roundtrip() {
        let cache = DurableCache::in_memory();
        assert!(cache.load("customers").is_none());

        cache.save("customers", &sample_state());
        let loaded = cache.load("customers").expect("entry should exist");
        assert_eq!(loaded, sample_state());

        cache.clear("customers");
        assert!(cache.load("customers").is_none());
    }

    #[test]
    fn namespaces_are_isolated() {
        let cache = DurableCache::in_memory();
        cache.save("customers", &sample_state());
        assert!(cache.load("dealers").is_none());
    }

    #[test]
    fn corrupt_entry_loads_as_absent() {
        let store = Arc::new(MemoryCacheStore::new());
        store.set("customers", "{not json").unwrap();
        let cache = DurableCache::new(store);
        assert!(cache.load("customers").is_none());
    }

    #[test]
    fn schema_drifted_entry_degrades_to_defaults() {
        let store = Arc::new(MemoryCacheStore::new());
        // An entry written by an older build: no result, no has_searched.
        store
            .set("customers", r#"{"query":{"filters":{"city":"Bonn"}}}"#)
            .unwrap();
        let cache = DurableCache::new(store);
        let state = cache.load("customers").expect("drifted entry still loads");
        assert!(!state.has_searched);
        assert!(state.result.is_none());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = DurableCache::new(Arc::new(JsonFileCacheStore::new(dir.path())));
            cache.save("projects", &sample_state());
        }
        let cache = DurableCache::new(Arc::new(JsonFileCacheStore::new(dir.path())));
        assert_eq!(cache.load("projects"), Some(sample_state()));
    }

    #[test]
    fn file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DurableCache::new(Arc::new(JsonFileCacheStore::new(dir.path())));
        cache.clear("projects");
        cache.save("projects", &sample_state());
        cache.clear("projects");
        cache.clear("projects");
        assert!(cache.load("projects").is_none());
    }

    #[test]
    fn unavailable_store_never_panics() {
        struct BrokenStore;
        impl CacheStore for BrokenStore {
            fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
                Err(CacheError::unavailable("quota exceeded"))
            }
            fn set(&self, _key: &str, _value: &str) -> Result<(), CacheError> {
                Err(CacheError::unavailable("quota exceeded"))
            }
            fn remove(&self, _key: &str) -> Result<(), CacheError> {
                Err(CacheError::unavailable("quota exceeded"))
            }
        }

        let cache = DurableCache::new(Arc::new(BrokenStore));
        cache.save("customers", &sample_state());
        cache.clear("customers");
        assert!(cache.load("customers").is_none());
    }
}
