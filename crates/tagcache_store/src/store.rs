// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for key-value store backends.
//!
//! [`KeyValueStore`] is the only thing the tag-versioning layer needs from a backend.
//! Values are opaque bytes; encoding is the caller's concern.

use std::{collections::HashMap, time::Duration};

use crate::Error;

/// Optional primitives a store implements natively.
///
/// A store that leaves a capability unset still supports the operation through the
/// provided fallback on [`KeyValueStore`]; the flag only states whether the operation is a
/// single atomic backend call.
///
/// The flags are informational. The tag-versioning layer always calls the batch and atomic
/// forms and never branches on them; they let callers and diagnostics tell which guarantees
/// a given backend provides.
///
/// # Examples
///
/// ```
/// use tagcache_store::Capabilities;
///
/// let caps = Capabilities {
///     batch_read: true,
///     ..Capabilities::default()
/// };
/// assert!(!caps.atomic_add);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// [`KeyValueStore::get_many`] fetches all keys in one round trip.
    pub batch_read: bool,
    /// [`KeyValueStore::add`] is an atomic set-if-absent.
    pub atomic_add: bool,
    /// [`KeyValueStore::replace`] is an atomic replace-if-exists.
    pub atomic_replace: bool,
}

/// Trait for key-value store backends.
///
/// `get`, `set`, `delete` and `clear` are required. `get_many`, `add` and `replace` have
/// portable fallbacks built on the required methods:
/// - `get_many`: one `get` per key
/// - `add`: `get`, then `set` when the key is absent (not atomic)
/// - `replace`: `get`, then `set` when the key is present (not atomic)
///
/// Backends with native support override them and report it from `capabilities`.
///
/// A `ttl` of `None` means the value never expires.
#[cfg_attr(
    any(test, feature = "dynamic-store"),
    dynosaur::dynosaur(pub(crate) DynKeyValueStore = dyn(box) KeyValueStore, bridge(none))
)]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value, returning `None` if the key is absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, Error>> + Send;

    /// Writes a value unconditionally.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> impl Future<Output = Result<(), Error>> + Send;

    /// Deletes a value, returning whether the key existed.
    fn delete(&self, key: &str) -> impl Future<Output = Result<bool, Error>> + Send;

    /// Removes every value from the store.
    fn clear(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Reads several values at once. Absent keys are omitted from the result.
    fn get_many(&self, keys: &[String]) -> impl Future<Output = Result<HashMap<String, Vec<u8>>, Error>> + Send {
        async move {
            let mut found = HashMap::with_capacity(keys.len());
            for key in keys {
                if let Some(value) = self.get(key).await? {
                    found.insert(key.clone(), value);
                }
            }
            Ok(found)
        }
    }

    /// Writes a value only if the key is absent, returning whether it was written.
    fn add(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> impl Future<Output = Result<bool, Error>> + Send {
        async move {
            if self.get(key).await?.is_some() {
                return Ok(false);
            }
            self.set(key, value, ttl).await?;
            Ok(true)
        }
    }

    /// Writes a value only if the key is present, returning whether it was written.
    fn replace(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> impl Future<Output = Result<bool, Error>> + Send {
        async move {
            if self.get(key).await?.is_none() {
                return Ok(false);
            }
            self.set(key, value, ttl).await?;
            Ok(true)
        }
    }

    /// Returns the primitives this store implements natively.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }
}
