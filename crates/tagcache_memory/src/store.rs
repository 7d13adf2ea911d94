// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory store implementation using moka.

use std::time::{Duration, Instant};

use moka::{
    Expiry,
    future::Cache,
    ops::compute::{CompResult, Op},
};
use tagcache_store::{Capabilities, Error, KeyValueStore};
use thread_aware::{Arc, PerProcess, ThreadAware};

use crate::builder::InMemoryStoreBuilder;

#[derive(Debug, Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    ttl: Option<Duration>,
}

impl StoredValue {
    fn new(bytes: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self { bytes, ttl }
    }
}

/// Expires each value after the ttl it was written with; `None` never expires.
#[derive(Debug)]
struct PerValueTtl;

impl Expiry<String, StoredValue> for PerValueTtl {
    fn expire_after_create(&self, _key: &String, value: &StoredValue, _created_at: Instant) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// An in-process key-value store backed by moka.
///
/// This store provides:
/// - Concurrent access from many tasks
/// - Per-value time-to-live
/// - Atomic set-if-absent and replace-if-exists through moka's entry API
///
/// Clones share the same underlying data.
///
/// # Examples
///
/// ```
/// use tagcache_memory::InMemoryStore;
/// use tagcache_store::KeyValueStore;
/// # futures::executor::block_on(async {
///
/// let store = InMemoryStore::new();
///
/// store.set("key", b"42".to_vec(), None).await?;
/// assert_eq!(store.get("key").await?, Some(b"42".to_vec()));
///
/// // set-if-absent loses against the existing value
/// assert!(!store.add("key", b"7".to_vec(), None).await?);
/// # Ok::<(), tagcache_store::Error>(())
/// # });
/// ```
#[derive(Debug, Clone, ThreadAware)]
pub struct InMemoryStore {
    // Moka is safe to share across threads, so one instance serves the whole process.
    inner: Arc<Cache<String, StoredValue>, PerProcess>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new unbounded in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new in-memory store holding at most `max_capacity` values.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a new builder for configuring an in-memory store.
    #[must_use]
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::new()
    }

    pub(crate) fn from_builder(builder: &InMemoryStoreBuilder) -> Self {
        let mut moka_builder = Cache::builder().expire_after(PerValueTtl);

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: Arc::from_unaware(moka_builder.build()),
        }
    }
}

impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.inner.get(key).await.map(|stored| stored.bytes))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), Error> {
        self.inner.insert(key.to_owned(), StoredValue::new(value, ttl)).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        Ok(self.inner.remove(key).await.is_some())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.inner.invalidate_all();
        Ok(())
    }

    async fn add(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<bool, Error> {
        let stored = StoredValue::new(value, ttl);
        let entry = self
            .inner
            .entry(key.to_owned())
            .or_insert_with(std::future::ready(stored))
            .await;
        Ok(entry.is_fresh())
    }

    async fn replace(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<bool, Error> {
        let stored = StoredValue::new(value, ttl);
        let result = self
            .inner
            .entry(key.to_owned())
            .and_compute_with(|existing| {
                let op = if existing.is_some() { Op::Put(stored) } else { Op::Nop };
                std::future::ready(op)
            })
            .await;
        Ok(matches!(result, CompResult::ReplacedWith(_)))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            batch_read: false,
            atomic_add: true,
            atomic_replace: true,
        }
    }
}
