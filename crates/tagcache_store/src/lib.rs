// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Key-value store contract for tag-versioned cache backends.
//!
//! This crate defines the [`KeyValueStore`] trait every backend adapter implements, along
//! with the shared [`Error`] type. The tag-versioning layer in `tagcache` only ever calls
//! these primitives, so any store that can get, set and delete raw bytes can carry tagged
//! entries.
//!
//! # Capabilities
//!
//! Besides the required operations, a store may natively support:
//!
//! - **batch reads** ([`KeyValueStore::get_many`]), used to validate every tag of an entry
//!   in a single round trip;
//! - **set-if-absent** ([`KeyValueStore::add`]), used when a tag is created;
//! - **replace-if-exists** ([`KeyValueStore::replace`]), used when a tag is invalidated.
//!
//! Each has a provided fallback built on the required operations. Stores that override
//! them report it through [`KeyValueStore::capabilities`].
//!
//! # Implementing a Store
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::Duration;
//!
//! use tagcache_store::{Error, KeyValueStore};
//!
//! struct SimpleStore(RwLock<HashMap<String, Vec<u8>>>);
//!
//! impl KeyValueStore for SimpleStore {
//!     async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &str, value: Vec<u8>, _ttl: Option<Duration>) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.to_owned(), value);
//!         Ok(())
//!     }
//!
//!     async fn delete(&self, key: &str) -> Result<bool, Error> {
//!         Ok(self.0.write().unwrap().remove(key).is_some())
//!     }
//!
//!     async fn clear(&self) -> Result<(), Error> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! Enable the `dynamic-store` feature for [`DynamicStore`], which erases the concrete store
//! type. Use it when the backend is chosen at runtime.

pub mod error;
mod store;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[cfg(any(test, feature = "dynamic-store"))]
mod dynamic;

#[cfg(any(test, feature = "dynamic-store"))]
#[doc(inline)]
pub use dynamic::{DynamicStore, DynamicStoreExt};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use store::{Capabilities, KeyValueStore};
