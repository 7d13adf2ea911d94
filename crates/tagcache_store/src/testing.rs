// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides `MockStore`, an in-memory store that records every backend call
//! and supports failure injection for testing error paths.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{Error, KeyValueStore};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A get was performed for the given key.
    Get(String),
    /// A set was performed.
    Set {
        /// The key that was written.
        key: String,
        /// The bytes that were written.
        value: Vec<u8>,
        /// The requested time-to-live.
        ttl: Option<Duration>,
    },
    /// A delete was performed for the given key.
    Delete(String),
    /// A clear was performed.
    Clear,
}

impl StoreOp {
    /// Returns the key this operation touched, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Get(key) | Self::Delete(key) | Self::Set { key, .. } => Some(key),
            Self::Clear => None,
        }
    }
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A configurable mock store for testing.
///
/// `MockStore` implements only the required [`KeyValueStore`] operations, so batch reads,
/// `add` and `replace` run through the portable fallbacks. That makes it a stand-in for the
/// most limited kind of backend. All operations are recorded for later verification.
///
/// # Examples
///
/// ```ignore
/// use tagcache_store::{KeyValueStore, testing::{MockStore, StoreOp}};
///
/// # futures::executor::block_on(async {
/// let store = MockStore::new();
///
/// store.set("key", b"42".to_vec(), None).await.unwrap();
/// assert_eq!(store.get("key").await.unwrap(), Some(b"42".to_vec()));
///
/// assert_eq!(store.operations(), vec![
///     StoreOp::Set { key: "key".to_string(), value: b"42".to_vec(), ttl: None },
///     StoreOp::Get("key".to_string()),
/// ]);
/// # });
/// ```
///
/// # Failure Injection
///
/// ```ignore
/// use tagcache_store::{KeyValueStore, testing::{MockStore, StoreOp}};
///
/// # futures::executor::block_on(async {
/// let store = MockStore::new();
///
/// // Fail every write to one key
/// store.fail_when(|op| matches!(op, StoreOp::Set { key, .. } if key == "forbidden"));
/// assert!(store.set("forbidden", Vec::new(), None).await.is_err());
/// assert!(store.set("allowed", Vec::new(), None).await.is_ok());
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MockStore {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl MockStore {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock store with pre-populated data.
    #[must_use]
    pub fn with_data(data: HashMap<String, Vec<u8>>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            ..Self::default()
        }
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the store holds a value for the given key.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Returns the raw bytes stored under the given key, bypassing recording.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.data.lock().get(key).cloned()
    }

    /// Writes raw bytes under the given key, bypassing recording and failure injection.
    pub fn put_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.data.lock().insert(key.into(), value.into());
    }

    /// Sets a predicate that determines which operations fail.
    ///
    /// Failed operations are still recorded but leave the data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn check(&self, op: StoreOp, message: &'static str) -> Result<(), Error> {
        let failed = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if failed { Err(Error::from_message(message)) } else { Ok(()) }
    }
}

impl KeyValueStore for MockStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        self.check(StoreOp::Get(key.to_owned()), "mock: get failed")?;
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), Error> {
        let op = StoreOp::Set {
            key: key.to_owned(),
            value: value.clone(),
            ttl,
        };
        self.check(op, "mock: set failed")?;
        self.data.lock().insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        self.check(StoreOp::Delete(key.to_owned()), "mock: delete failed")?;
        Ok(self.data.lock().remove(key).is_some())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.check(StoreOp::Clear, "mock: clear failed")?;
        self.data.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn records_operations_in_order() {
        block_on(async {
            let store = MockStore::new();
            store.set("key", b"42".to_vec(), None).await.unwrap();
            assert_eq!(store.get("key").await.unwrap(), Some(b"42".to_vec()));
            assert!(store.delete("key").await.unwrap());

            assert_eq!(
                store.operations(),
                vec![
                    StoreOp::Set {
                        key: "key".to_string(),
                        value: b"42".to_vec(),
                        ttl: None,
                    },
                    StoreOp::Get("key".to_string()),
                    StoreOp::Delete("key".to_string()),
                ]
            );
        });
    }

    #[test]
    fn failed_operations_leave_data_untouched() {
        block_on(async {
            let store = MockStore::new();
            store.fail_when(|op| matches!(op, StoreOp::Set { key, .. } if key == "forbidden"));

            assert!(store.set("forbidden", b"x".to_vec(), None).await.is_err());
            assert!(store.set("allowed", b"y".to_vec(), None).await.is_ok());
            assert!(!store.contains_key("forbidden"));
            assert_eq!(store.entry_count(), 1);
            assert_eq!(store.operations().len(), 2);

            store.clear_failures();
            assert!(store.set("forbidden", b"x".to_vec(), None).await.is_ok());
        });
    }

    #[test]
    fn raw_access_bypasses_recording() {
        let store = MockStore::new();
        store.put_raw("key", b"raw".to_vec());
        assert_eq!(store.raw("key"), Some(b"raw".to_vec()));
        assert!(store.operations().is_empty());
    }

    #[test]
    fn mock_store_uses_fallback_capabilities() {
        block_on(async {
            let store = MockStore::new();
            assert_eq!(store.capabilities(), crate::Capabilities::default());

            assert!(store.add("key", b"1".to_vec(), None).await.unwrap());
            assert!(!store.add("key", b"2".to_vec(), None).await.unwrap());
            assert!(store.replace("key", b"3".to_vec(), None).await.unwrap());
            assert_eq!(store.raw("key"), Some(b"3".to_vec()));

            store.clear_operations();
            let found = store.get_many(&["key".to_string(), "missing".to_string()]).await.unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(
                store.operations(),
                vec![StoreOp::Get("key".to_string()), StoreOp::Get("missing".to_string())]
            );
        });
    }

    #[test]
    fn op_key_reports_touched_key() {
        assert_eq!(StoreOp::Get("a".to_string()).key(), Some("a"));
        assert_eq!(StoreOp::Delete("b".to_string()).key(), Some("b"));
        assert_eq!(StoreOp::Clear.key(), None);
    }
}
