//! Read-through memoization keyed by source identity.
//!
//! Entries are retained for the life of the cache (the key space is a handful
//! of file paths and URLs). Concurrent callers asking for the same key block
//! on a single in-flight computation and share its result. Failed
//! computations leave no entry behind, so the next call retries.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::OnceCell;

/// Identity of a data source: a local path or a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    Path(PathBuf),
    Url(String),
}

impl SourceId {
    /// Classifies a location string; `http://` and `https://` are URLs.
    pub fn from_location(location: &str) -> Self {
        if is_url(location) {
            SourceId::Url(location.to_string())
        } else {
            SourceId::Path(PathBuf::from(location))
        }
    }

    pub fn path(path: &Path) -> Self {
        SourceId::Path(path.to_path_buf())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Path(path) => write!(f, "{}", path.display()),
            SourceId::Url(url) => write!(f, "{url}"),
        }
    }
}

pub(crate) fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

type Slot<V> = Arc<OnceCell<Arc<V>>>;

/// Unbounded compute-once-per-key store.
pub struct MemoCache<K, V> {
    entries: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, computing it with `compute` if no
    /// value has been stored yet.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, compute: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let slot = {
            let mut entries = self.lock();
            Arc::clone(entries.entry(key.clone()).or_default())
        };
        // The map lock is released here so other keys are not blocked while
        // this one computes.
        let result = slot.get_or_try_init(|| compute().map(Arc::new)).cloned();
        if result.is_err() {
            self.discard_empty(key, &slot);
        }
        result
    }

    /// Drops the slot for `key` if it is still the one that just failed and no
    /// caller has filled it since.
    fn discard_empty(&self, key: &K, slot: &Slot<V>) {
        let mut entries = self.lock();
        if let Some(current) = entries.get(key) {
            if Arc::ptr_eq(current, slot) && current.get().is_none() {
                entries.remove(key);
            }
        }
    }

    /// Number of slots in the map, including ones still computing.
    pub fn slot_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns the cached value without computing anything.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Number of keys holding a computed value.
    pub fn len(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the value stored for `key`, if any.
    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some_and(|slot| slot.get().is_some())
    }

    /// Drops every stored value.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for MemoCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<K> = self.lock().keys().cloned().collect();
        f.debug_struct("MemoCache").field("keys", &keys).finish()
    }
}
