// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Tag-based cache invalidation over plain key-value stores.
//!
//! Entries are stored with a set of tags. Invalidating a tag turns every entry carrying it
//! into a miss, without tracking which entries those are: each tag has a version, each entry
//! remembers the versions of its tags at write time, and a read compares the two.
//!
//! This crate provides:
//! - [`TaggedCache`], the tag-versioning layer, generic over any [`KeyValueStore`]
//! - [`InMemoryStore`] (feature `memory`, on by default) and [`RedisStore`] (feature `redis`)
//! - Structured logs through `tracing` and, with the `metrics` feature, OpenTelemetry metrics
//!
//! # Examples
//!
//! ```
//! use tagcache::TaggedCache;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let clock = Clock::new_frozen();
//! let cache = TaggedCache::builder(clock).memory().build();
//!
//! cache.set("user:1", "Ada", None, &["users"]).await?;
//! cache.set("user:2", "Grace", None, &["users"]).await?;
//! assert!(cache.has("user:1").await?);
//!
//! // One call invalidates both entries.
//! cache.remove_tag("users").await?;
//! assert_eq!(cache.get::<String>("user:1").await?, None);
//! assert_eq!(cache.get::<String>("user:2").await?, None);
//! # Ok::<(), tagcache::Error>(())
//! # });
//! ```
//!
//! ## Counters
//!
//! ```
//! use tagcache::TaggedCache;
//! use tick::Clock;
//! # futures::executor::block_on(async {
//!
//! let cache = TaggedCache::builder(Clock::new_frozen()).memory().build();
//!
//! assert_eq!(cache.increment("visits", 5, None).await?, 5);
//! assert_eq!(cache.decrement("visits", 2, None).await?, Some(3));
//!
//! // Decrementing a missing counter does not create it.
//! assert_eq!(cache.decrement("unknown", 1, None).await?, None);
//! # Ok::<(), tagcache::Error>(())
//! # });
//! ```
//!
//! # Stores
//!
//! Any [`KeyValueStore`] can back the cache. Stores with native batch reads validate all tags
//! of an entry in one round trip; stores with atomic set-if-absent and replace-if-exists make
//! tag creation and invalidation race-free. See [`Capabilities`].

pub mod builder;
pub mod cache;
mod envelope;
mod tags;
mod telemetry;
mod version;

#[doc(inline)]
pub use builder::TaggedCacheBuilder;
#[doc(inline)]
pub use cache::TaggedCache;
#[doc(inline)]
pub use envelope::TagSnapshot;
#[cfg(feature = "memory")]
#[doc(inline)]
pub use tagcache_memory::{InMemoryStore, InMemoryStoreBuilder};
#[cfg(feature = "redis")]
#[doc(inline)]
pub use tagcache_redis::RedisStore;
#[cfg(feature = "dynamic-store")]
#[doc(inline)]
pub use tagcache_store::{DynamicStore, DynamicStoreExt};
#[doc(inline)]
pub use tagcache_store::{Capabilities, Error, KeyValueStore, Result};
#[doc(inline)]
pub use telemetry::TelemetryConfig;
#[doc(inline)]
pub use version::TagVersion;

#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use tagcache_store::testing::{MockStore, StoreOp};
