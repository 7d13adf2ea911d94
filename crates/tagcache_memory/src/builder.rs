// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory stores.
//!
//! The builder keeps moka's configuration types out of the public API.

use crate::store::InMemoryStore;

/// Builder for configuring an `InMemoryStore`.
///
/// Expiration is not configured here: every value carries its own time-to-live, passed to
/// [`KeyValueStore::set`](tagcache_store::KeyValueStore::set) by the caller.
///
/// # Examples
///
/// ```
/// use tagcache_memory::InMemoryStore;
///
/// let store = InMemoryStore::builder()
///     .max_capacity(10_000)
///     .initial_capacity(100)
///     .name("page-cache")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) name: Option<String>,
}

impl InMemoryStoreBuilder {
    /// Creates a new builder for an unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of values the store holds.
    ///
    /// Once the capacity is reached, values are evicted using moka's `TinyLFU` policy.
    /// Tag versions live in the same store, so an evicted tag simply reads as absent and
    /// invalidates the entries that reference it.
    ///
    /// If not set, the store is unbounded.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the initial capacity (pre-allocation hint) for the store.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets a name for the store, used by moka in its own diagnostics.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured `InMemoryStore`.
    #[must_use]
    pub fn build(self) -> InMemoryStore {
        InMemoryStore::from_builder(&self)
    }
}
