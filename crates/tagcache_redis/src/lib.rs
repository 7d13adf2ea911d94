// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Redis-backed key-value store for tag-versioned caches.
//!
//! [`RedisStore`] implements [`KeyValueStore`](tagcache_store::KeyValueStore) with every
//! optional primitive mapped onto a native Redis command, so validating an entry's tags
//! costs one `MGET` and tag creation and invalidation are atomic across processes.

mod store;

#[doc(inline)]
pub use store::RedisStore;
