// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type-erased store wrapper.

use std::{collections::HashMap, fmt::Debug, sync::Arc, time::Duration};

use crate::{Capabilities, Error, KeyValueStore, store::DynKeyValueStore};

/// Extension trait for converting any `KeyValueStore` into a `DynamicStore`.
///
/// This trait is automatically implemented for all types that implement `KeyValueStore`.
///
/// # Examples
///
/// ```
/// use tagcache_store::{DynamicStore, DynamicStoreExt, KeyValueStore};
///
/// fn erase<S>(store: S) -> DynamicStore
/// where
///     S: KeyValueStore + 'static,
/// {
///     store.into_dynamic()
/// }
/// ```
pub trait DynamicStoreExt: Sized {
    /// Converts this store into a `DynamicStore`.
    fn into_dynamic(self) -> DynamicStore;
}

impl<S> DynamicStoreExt for S
where
    S: KeyValueStore + 'static,
{
    fn into_dynamic(self) -> DynamicStore {
        DynamicStore::new(self)
    }
}

/// A clonable store with the concrete backend type erased.
///
/// Use it when the backend is picked at runtime, for example from configuration, and the
/// cache type must not depend on that choice. Native capabilities of the wrapped store are
/// preserved: calls to `get_many`, `add` and `replace` reach the backend's own
/// implementation.
pub struct DynamicStore(Arc<DynKeyValueStore<'static>>);

impl DynamicStore {
    pub(crate) fn new<S>(store: S) -> Self
    where
        S: KeyValueStore + 'static,
    {
        Self(DynKeyValueStore::new_arc(store))
    }
}

impl Debug for DynamicStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicStore")
            .field("capabilities", &self.0.capabilities())
            .finish()
    }
}

impl Clone for DynamicStore {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl KeyValueStore for DynamicStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        self.0.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), Error> {
        self.0.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        self.0.delete(key).await
    }

    async fn clear(&self) -> Result<(), Error> {
        self.0.clear().await
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>, Error> {
        self.0.get_many(keys).await
    }

    async fn add(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<bool, Error> {
        self.0.add(key, value, ttl).await
    }

    async fn replace(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<bool, Error> {
        self.0.replace(key, value, ttl).await
    }

    fn capabilities(&self) -> Capabilities {
        self.0.capabilities()
    }
}
