//! Resolution cache and the external cache collaborator.
//!
//! The container remembers the last value produced for every abstract.
//! That table can be checkpointed into an external [`ContainerCache`]
//! under an opaque key and loaded back later.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::value::Value;

/// A checkpoint of the resolution cache.
pub type Snapshot = HashMap<String, Value>;

/// Key/value store the resolution cache can be flushed into.
///
/// `ttl` is a hint; implementations may ignore it.
pub trait ContainerCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Snapshot>;

    fn set(&self, key: &str, value: Snapshot, ttl: Duration) -> bool;

    fn has(&self, key: &str) -> bool;

    fn delete(&self, key: &str) -> bool;
}

/// In-process [`ContainerCache`]. Ignores TTL.
///
/// ```
/// use std::time::Duration;
/// use rabt_container::cache::{ContainerCache, InMemoryCache, Snapshot};
///
/// let cache = InMemoryCache::new();
/// assert!(cache.set("k", Snapshot::new(), Duration::from_secs(1)));
/// assert!(cache.has("k"));
/// assert!(cache.delete("k"));
/// assert!(cache.delete("k"));
/// assert!(cache.get("k").is_none());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Snapshot>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContainerCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Snapshot> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: Snapshot, _ttl: Duration) -> bool {
        self.entries.insert(key.to_string(), value);
        true
    }

    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.remove(key);
        true
    }
}

/// Last resolved value per abstract, plus the optional external store.
#[derive(Default)]
pub(crate) struct ResolutionCache {
    resolved: Mutex<IndexMap<String, Value>>,
    external: RwLock<Option<Arc<dyn ContainerCache>>>,
}

impl ResolutionCache {
    /// Opaque key derived from anything hashable.
    ///
    /// Equal sources give equal keys for the lifetime of the process.
    pub fn derive_key<K: Hash + ?Sized>(source: &K) -> String {
        let mut hasher = DefaultHasher::new();
        source.hash(&mut hasher);
        format!("rabt.resolved.{:016x}", hasher.finish())
    }

    pub fn store(&self, abstract_id: &str, value: Value) {
        trace!(abstract_id, "Caching resolved service");
        self.resolved.lock().insert(abstract_id.to_string(), value);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.resolved
            .lock()
            .iter()
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect()
    }

    pub fn set_external(&self, cache: Arc<dyn ContainerCache>) {
        *self.external.write() = Some(cache);
    }

    pub fn external(&self) -> Option<Arc<dyn ContainerCache>> {
        self.external.read().clone()
    }

    /// Flushes into the external store (when set) and empties the table.
    pub fn clear(&self, key: &str, ttl: Duration) {
        if let Some(external) = self.external() {
            let written = external.set(key, self.snapshot(), ttl);
            debug!(key, written, "Flushed resolved services to external cache");
        }
        self.resolved.lock().clear();
    }

    /// Replaces the table with the external entry under `key`, if any.
    pub fn load(&self, key: &str) -> bool {
        let Some(external) = self.external() else {
            return false;
        };
        if !external.has(key) {
            return false;
        }
        let Some(snapshot) = external.get(key) else {
            return false;
        };

        debug!(key, entries = snapshot.len(), "Loaded resolved services from external cache");
        *self.resolved.lock() = snapshot.into_iter().collect();
        true
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("resolved", &self.resolved.lock().len())
            .field("external", &self.external.read().is_some())
            .finish()
    }
}
