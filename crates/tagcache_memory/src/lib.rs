// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-process key-value store for tag-versioned caches, backed by moka.
//!
//! [`InMemoryStore`] implements [`KeyValueStore`](tagcache_store::KeyValueStore) with
//! per-value expiration and native atomic `add` and `replace`, so tag creation and tag
//! invalidation never race inside one process. Use [`InMemoryStoreBuilder`] to bound its
//! capacity.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use tagcache_memory::InMemoryStore;
//! use tagcache_store::KeyValueStore;
//!
//! # futures::executor::block_on(async {
//! let store = InMemoryStore::builder().max_capacity(1000).build();
//!
//! store.set("greeting", b"hello".to_vec(), Some(Duration::from_secs(300))).await?;
//! assert_eq!(store.get("greeting").await?, Some(b"hello".to_vec()));
//! # Ok::<(), tagcache_store::Error>(())
//! # });
//! ```

pub mod builder;
pub mod store;

#[doc(inline)]
pub use builder::InMemoryStoreBuilder;
#[doc(inline)]
pub use store::InMemoryStore;
