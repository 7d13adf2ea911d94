// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for [`TaggedCache`].

use std::time::Duration;

use tagcache_store::KeyValueStore;
use tick::Clock;

#[cfg(feature = "memory")]
use tagcache_memory::InMemoryStore;

use crate::{
    TaggedCache, TelemetryConfig,
    cache::CacheName,
    tags::TagStore,
};

const DEFAULT_NAME: CacheName = "tagcache";
const DEFAULT_TAG_PREFIX: &str = "tag:";

/// Builder for constructing a [`TaggedCache`].
///
/// Created by [`TaggedCache::builder`]. Pick a store with [`storage`](Self::storage) or
/// [`memory`](Self::memory), adjust the optional settings, then call
/// [`build`](TaggedCacheBuilder::build).
///
/// | Setting | Default |
/// |---|---|
/// | `name` | `"tagcache"` |
/// | `key_prefix` | none |
/// | `tag_prefix` | `"tag:"` |
/// | `default_ttl` | no expiry |
/// | `telemetry` | disabled |
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use tagcache::{InMemoryStore, TaggedCache, TelemetryConfig};
/// use tick::Clock;
///
/// let store = InMemoryStore::builder().max_capacity(10_000).build();
/// let cache = TaggedCache::builder(Clock::new_frozen())
///     .storage(store)
///     .name("pages")
///     .key_prefix("page:")
///     .tag_prefix("page-tag:")
///     .default_ttl(Duration::from_secs(600))
///     .telemetry(TelemetryConfig::new().with_logs())
///     .build();
///
/// assert_eq!(cache.tag_key("home"), "page-tag:home");
/// ```
#[derive(Debug)]
pub struct TaggedCacheBuilder<S = ()> {
    name: CacheName,
    storage: S,
    clock: Clock,
    key_prefix: String,
    tag_prefix: String,
    default_ttl: Option<Duration>,
    telemetry: Option<TelemetryConfig>,
}

impl TaggedCacheBuilder<()> {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            name: DEFAULT_NAME,
            storage: (),
            clock,
            key_prefix: String::new(),
            tag_prefix: DEFAULT_TAG_PREFIX.to_owned(),
            default_ttl: None,
            telemetry: None,
        }
    }

    /// Sets the store the cache writes through to.
    ///
    /// Any [`KeyValueStore`] works, including a type-erased `DynamicStore`.
    pub fn storage<S>(self, storage: S) -> TaggedCacheBuilder<S>
    where
        S: KeyValueStore,
    {
        TaggedCacheBuilder {
            name: self.name,
            storage,
            clock: self.clock,
            key_prefix: self.key_prefix,
            tag_prefix: self.tag_prefix,
            default_ttl: self.default_ttl,
            telemetry: self.telemetry,
        }
    }

    /// Uses an unbounded in-process store.
    ///
    /// Use [`storage`](Self::storage) with [`InMemoryStore::builder`] to bound its capacity.
    #[cfg(feature = "memory")]
    #[must_use]
    pub fn memory(self) -> TaggedCacheBuilder<InMemoryStore> {
        self.storage(InMemoryStore::new())
    }
}

impl<S> TaggedCacheBuilder<S> {
    /// Sets the name reported in logs and metrics.
    #[must_use]
    pub fn name(mut self, name: CacheName) -> Self {
        self.name = name;
        self
    }

    /// Sets a prefix prepended to every entry key before it reaches the store.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the prefix of the keys tag versions are stored under.
    #[must_use]
    pub fn tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = prefix.into();
        self
    }

    /// Sets the time-to-live used when an operation passes `None`.
    #[must_use]
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Enables telemetry for this cache.
    #[must_use]
    pub fn telemetry(mut self, config: TelemetryConfig) -> Self {
        self.telemetry = Some(config);
        self
    }
}

impl<S> TaggedCacheBuilder<S>
where
    S: KeyValueStore,
{
    /// Builds the cache.
    #[must_use]
    pub fn build(self) -> TaggedCache<S> {
        TaggedCache {
            name: self.name,
            storage: self.storage,
            tags: TagStore::new(self.tag_prefix, self.clock.clone()),
            clock: self.clock,
            key_prefix: self.key_prefix,
            default_ttl: self.default_ttl,
            telemetry: self.telemetry.map(TelemetryConfig::build),
        }
    }
}
