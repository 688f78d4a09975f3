use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::counter::Counter;
use crate::error::StoreError;
use crate::store::{Matched, MqttStore};
use crate::topic::SEPARATOR;
use crate::Result;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreOptions {
    // The maximum number of levels in a stored key, where 0 indicates no limit.
    #[serde(default = "StoreOptions::max_topic_levels_default")]
    pub max_topic_levels: usize,

    // The maximum number of stored values, where 0 indicates no limit. After the limit is reached,
    // existing keys can still be replaced, but values cannot be stored under new keys.
    #[serde(default = "StoreOptions::max_entries_default")]
    pub max_entries: isize,
}

impl Default for StoreOptions {
    #[inline]
    fn default() -> Self {
        Self { max_topic_levels: Self::max_topic_levels_default(), max_entries: Self::max_entries_default() }
    }
}

impl StoreOptions {
    fn max_topic_levels_default() -> usize {
        0
    }

    fn max_entries_default() -> isize {
        0
    }
}

/// [`MqttStore`] behind a read-write lock. Lookups run concurrently, `put`/`remove`/`retain`
/// take the lock exclusively. Clones share the same store.
pub struct SharedStore<V> {
    inner: Arc<RwLock<MqttStore<V>>>,
    opts: Arc<StoreOptions>,
    entries: Arc<Counter>,
}

impl<V> Clone for SharedStore<V> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), opts: self.opts.clone(), entries: self.entries.clone() }
    }
}

impl<V> Default for SharedStore<V> {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl<V> std::fmt::Debug for SharedStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedStore {{ opts: {:?}, entries: {:?} }}", self.opts, self.entries)
    }
}

impl<V> SharedStore<V> {
    #[inline]
    pub fn new(opts: StoreOptions) -> Self {
        Self::from_store(MqttStore::new(), opts)
    }

    /// Takes over an existing store, e.g. one restored from a snapshot.
    #[inline]
    pub fn from_store(store: MqttStore<V>, opts: StoreOptions) -> Self {
        let entries = Counter::new();
        entries.sets(store.len() as isize);
        Self { inner: Arc::new(RwLock::new(store)), opts: Arc::new(opts), entries: Arc::new(entries) }
    }

    #[inline]
    pub fn options(&self) -> &StoreOptions {
        &self.opts
    }

    /// Stores `value` under `key`, subject to the configured limits. An empty key is ignored.
    pub fn put(&self, key: &str, value: V) -> Result<()> {
        if key.is_empty() {
            return Ok(());
        }

        let max_topic_levels = self.opts.max_topic_levels;
        if max_topic_levels > 0 && key.split(SEPARATOR).count() > max_topic_levels {
            log::warn!("violation of max_topic_levels constraint, limit: {}, key: {:?}", max_topic_levels, key);
            return Err(StoreError::TooManyTopicLevels(format!(
                "key `{}` exceeds the limit of {} levels",
                key, max_topic_levels
            )));
        }

        let mut store = self.inner.write();
        let exists = store.contains_key(key);
        let max_entries = self.opts.max_entries;
        if !exists && max_entries > 0 && self.entries.count() >= max_entries {
            log::warn!("The stored values have reached the maximum limit of: {}, key: {:?}", max_entries, key);
            return Err(StoreError::TooManyEntries(max_entries));
        }
        store.put(key, value);
        if !exists {
            self.entries.inc();
        }
        Ok(())
    }

    #[inline]
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut store = self.inner.write();
        let old = store.remove(key);
        if old.is_some() {
            self.entries.dec();
        }
        old
    }

    #[inline]
    pub fn retain<F>(&self, f: F) -> usize
    where
        F: FnMut(&mut V) -> bool,
    {
        let mut store = self.inner.write();
        let removeds = store.retain(f);
        self.entries.decs(removeds as isize);
        removeds
    }

    /// Number of stored values, as tracked by [`SharedStore::counter`].
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.count() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn counter(&self) -> &Counter {
        &self.entries
    }

    /// Runs `f` with the store read-locked.
    #[inline]
    pub fn read<R>(&self, f: impl FnOnce(&MqttStore<V>) -> R) -> R {
        f(&self.inner.read())
    }
}

impl<V: Clone> SharedStore<V> {
    #[inline]
    pub fn get(&self, key: &str) -> Option<Matched<V>> {
        self.inner.read().get(key).map(Matched::cloned)
    }

    #[inline]
    pub fn find_matching(&self, pattern: &str) -> Result<Vec<Matched<V>>> {
        Ok(self.inner.read().find_matching(pattern)?.into_iter().map(Matched::cloned).collect())
    }

    #[inline]
    pub fn find_patterns(&self, key: &str) -> Result<Vec<Matched<V>>> {
        Ok(self.inner.read().find_patterns(key)?.into_iter().map(Matched::cloned).collect())
    }
}
