// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The tag-versioned cache.

use std::{
    borrow::Cow,
    collections::{BTreeSet, HashMap},
    time::Duration,
};

use serde::{Serialize, de::DeserializeOwned, de::IgnoredAny};
use tagcache_store::KeyValueStore;
use tick::Clock;

use crate::{
    Error, Result, TagVersion,
    builder::TaggedCacheBuilder,
    envelope::{self, Envelope, TagSnapshot},
    tags::{self, TagStore},
    telemetry::{CacheActivity, CacheOperation, CacheTelemetry, ext::CacheTelemetryExt},
};

/// Type alias for cache names used in telemetry.
pub type CacheName = &'static str;

/// Outcome of reading and validating one entry.
enum Lookup<V> {
    Hit(Envelope<V>),
    Miss,
    Stale,
}

impl<V> Lookup<V> {
    fn activity(&self) -> CacheActivity {
        match self {
            Self::Hit(_) => CacheActivity::Hit,
            Self::Miss => CacheActivity::Miss,
            Self::Stale => CacheActivity::Stale,
        }
    }

    fn into_value(self) -> Option<V> {
        match self {
            Self::Hit(envelope) => Some(envelope.value),
            Self::Miss | Self::Stale => None,
        }
    }
}

fn require_key(key: &str) -> Result<()> {
    if key.is_empty() {
        Err(Error::invalid_argument("cache key must not be empty"))
    } else {
        Ok(())
    }
}

/// A cache whose entries can be invalidated in bulk by tag.
///
/// Every entry is written together with the versions its tags had at write time. Calling
/// [`remove_tag`](Self::remove_tag) moves a tag to a newer version, which makes every entry
/// written against the older one a miss on its next read. Entries themselves are never
/// enumerated; stale ones are deleted lazily when they are read.
///
/// Values are stored as JSON, so any `serde` type works. Only primitive store operations are
/// needed; see [`KeyValueStore`] for what a backend provides.
///
/// A miss, including a logically invalidated entry, is `Ok(None)` or `Ok(false)`. Backend
/// failures, undecodable payloads and invalid arguments are `Err`.
///
/// # Examples
///
/// ```
/// use tagcache::TaggedCache;
/// use tick::Clock;
/// # futures::executor::block_on(async {
/// # let clock = Clock::new_frozen();
///
/// let cache = TaggedCache::builder(clock).memory().build();
///
/// cache.set("key1", &["one", "two"], None, &["foo", "bar"]).await?;
/// cache.set("key2", "three", None, &["foo"]).await?;
///
/// assert!(cache.remove_tag("bar").await?);
///
/// assert_eq!(cache.get::<Vec<String>>("key1").await?, None);
/// assert_eq!(cache.get::<String>("key2").await?, Some("three".to_string()));
/// # Ok::<(), tagcache::Error>(())
/// # });
/// ```
///
/// # Consistency
///
/// Invalidation is best-effort and relies on timestamps from one coarse time source:
///
/// - A read racing with [`remove_tag`](Self::remove_tag) may return the old value once.
/// - [`increment`](Self::increment) and [`decrement`](Self::decrement) read, modify and
///   write, so concurrent callers can lose updates.
/// - Tag keys share the keyspace with entries. Use distinct key and tag prefixes when keys may
///   start with the tag prefix.
#[derive(Debug, Clone)]
pub struct TaggedCache<S> {
    pub(crate) name: CacheName,
    pub(crate) storage: S,
    pub(crate) clock: Clock,
    pub(crate) tags: TagStore,
    pub(crate) key_prefix: String,
    pub(crate) default_ttl: Option<Duration>,
    pub(crate) telemetry: Option<CacheTelemetry>,
}

impl TaggedCache<()> {
    /// Creates a new cache builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use tagcache::TaggedCache;
    /// use tick::Clock;
    ///
    /// let clock = Clock::new_frozen();
    /// let cache = TaggedCache::builder(clock)
    ///     .memory()
    ///     .default_ttl(Duration::from_secs(300))
    ///     .build();
    /// ```
    #[must_use]
    pub fn builder(clock: Clock) -> TaggedCacheBuilder {
        TaggedCacheBuilder::new(clock)
    }
}

impl<S> TaggedCache<S> {
    /// Returns the name used in telemetry.
    #[must_use]
    pub fn name(&self) -> CacheName {
        self.name
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the clock tag versions are taken from.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Returns the key under which the tag `name` is stored.
    #[must_use]
    pub fn tag_key(&self, name: &str) -> String {
        self.tags.key(name)
    }

    fn storage_key<'k>(&self, key: &'k str) -> Cow<'k, str> {
        if self.key_prefix.is_empty() {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(format!("{}{key}", self.key_prefix))
        }
    }

    /// `None` falls back to the default; zero means no expiry.
    fn effective_ttl(&self, ttl: Option<Duration>) -> Option<Duration> {
        ttl.or(self.default_ttl).filter(|ttl| !ttl.is_zero())
    }
}

impl<S> TaggedCache<S>
where
    S: KeyValueStore,
{
    /// Stores `value` under `key`, tagged with `tags`.
    ///
    /// Tags that do not exist yet are created with the current time as their version. A
    /// `ttl` of `None` uses the cache's default time-to-live; a zero `ttl` never expires.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is empty, the value cannot be serialized, or a tag or the
    /// entry cannot be written. A tag may have been created even if the entry write failed.
    pub async fn set<V>(&self, key: &str, value: &V, ttl: Option<Duration>, tags: &[&str]) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        let watch = self.clock.stopwatch();
        let result = self.set_inner(key, value, ttl, tags).await;
        self.telemetry
            .record_result(self.name, CacheOperation::Set, &result, |_| CacheActivity::Stored, watch.elapsed());
        result
    }

    /// Returns the value stored under `key`, or `None` if it is absent or any of its tags has
    /// been invalidated since it was written.
    ///
    /// An invalidated entry is deleted from the store; failing to delete it is logged and
    /// otherwise ignored. An empty key is always a miss.
    ///
    /// Only an empty stored payload counts as absent. An empty value such as `""` is a regular
    /// value and comes back as `Some`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the stored value does not decode as `V`.
    pub async fn get<V>(&self, key: &str) -> Result<Option<V>>
    where
        V: DeserializeOwned,
    {
        if key.is_empty() {
            return Ok(None);
        }

        let watch = self.clock.stopwatch();
        let result = self.lookup::<V>(&self.storage_key(key)).await;
        self.telemetry
            .record_result(self.name, CacheOperation::Get, &result, Lookup::activity, watch.elapsed());
        result.map(Lookup::into_value)
    }

    /// Returns whether [`get`](Self::get) would return a value, for any value type.
    ///
    /// This validates tags exactly like `get` and removes invalidated entries the same way.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or the entry is not a valid envelope.
    pub async fn has(&self, key: &str) -> Result<bool> {
        if key.is_empty() {
            return Ok(false);
        }

        let watch = self.clock.stopwatch();
        let result = self.lookup::<IgnoredAny>(&self.storage_key(key)).await;
        self.telemetry
            .record_result(self.name, CacheOperation::Has, &result, Lookup::activity, watch.elapsed());
        result.map(|lookup| matches!(lookup, Lookup::Hit(_)))
    }

    /// Adds `offset` to the counter under `key` and returns the new value.
    ///
    /// A missing or invalidated counter starts at `offset`, untagged. An existing counter keeps
    /// its tags.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is empty, the stored value is not an integer, the result
    /// overflows, or the store fails.
    pub async fn increment(&self, key: &str, offset: i64, ttl: Option<Duration>) -> Result<i64> {
        let watch = self.clock.stopwatch();
        let result = self.increment_inner(key, offset, ttl).await;
        self.telemetry
            .record_result(self.name, CacheOperation::Increment, &result, |_| CacheActivity::Stored, watch.elapsed());
        result
    }

    /// Subtracts `offset` from the counter under `key` and returns the new value.
    ///
    /// Unlike [`increment`](Self::increment), a missing or invalidated counter is not created:
    /// the result is `None` and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is empty, the stored value is not an integer, the result
    /// overflows, or the store fails.
    pub async fn decrement(&self, key: &str, offset: i64, ttl: Option<Duration>) -> Result<Option<i64>> {
        let watch = self.clock.stopwatch();
        let result = self.decrement_inner(key, offset, ttl).await;
        self.telemetry.record_result(
            self.name,
            CacheOperation::Decrement,
            &result,
            |value| {
                if value.is_some() {
                    CacheActivity::Stored
                } else {
                    CacheActivity::Miss
                }
            },
            watch.elapsed(),
        );
        result
    }

    /// Returns the current version of the tag `name`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_tag(&self, name: &str) -> Result<Option<TagVersion>> {
        let watch = self.clock.stopwatch();
        let result = self.tags.version(&self.storage, name).await;
        self.telemetry.record_result(
            self.name,
            CacheOperation::GetTag,
            &result,
            |version| {
                if version.is_some() {
                    CacheActivity::Hit
                } else {
                    CacheActivity::Miss
                }
            },
            watch.elapsed(),
        );
        result
    }

    /// Returns whether the tag `name` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn exists_tag(&self, name: &str) -> Result<bool> {
        Ok(self.get_tag(name).await?.is_some())
    }

    /// Invalidates every entry tagged with `name`.
    ///
    /// The tag moves to the current time, or one microsecond past its current version if the
    /// clock has not moved beyond it. Entries are not touched; they become misses on their
    /// next read. Returns `false` if the tag does not exist, since nothing can be tagged with
    /// it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn remove_tag(&self, name: &str) -> Result<bool> {
        let watch = self.clock.stopwatch();
        let result = self.tags.invalidate(&self.storage, name).await;
        self.telemetry.record_result(
            self.name,
            CacheOperation::RemoveTag,
            &result,
            |invalidated| {
                if *invalidated {
                    CacheActivity::Invalidated
                } else {
                    CacheActivity::Skipped
                }
            },
            watch.elapsed(),
        );
        result
    }

    /// Stores `value` only if `key` currently holds no valid entry. Returns whether it was
    /// written.
    ///
    /// The check and the write are separate store calls, so concurrent callers may both
    /// succeed.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set), plus any error from reading the existing entry.
    pub async fn add<V>(&self, key: &str, value: &V, ttl: Option<Duration>, tags: &[&str]) -> Result<bool>
    where
        V: Serialize + ?Sized,
    {
        let watch = self.clock.stopwatch();
        let result = self.add_inner(key, value, ttl, tags).await;
        self.telemetry.record_result(
            self.name,
            CacheOperation::Add,
            &result,
            |added| {
                if *added {
                    CacheActivity::Stored
                } else {
                    CacheActivity::Skipped
                }
            },
            watch.elapsed(),
        );
        result
    }

    /// Deletes the entry under `key`, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        if key.is_empty() {
            return Ok(false);
        }

        let watch = self.clock.stopwatch();
        let result = self.storage.delete(&self.storage_key(key)).await;
        self.telemetry.record_result(
            self.name,
            CacheOperation::Remove,
            &result,
            |removed| {
                if *removed {
                    CacheActivity::Removed
                } else {
                    CacheActivity::Miss
                }
            },
            watch.elapsed(),
        );
        result
    }

    /// Deletes every entry in `keys`.
    ///
    /// # Errors
    ///
    /// Returns the first store error; keys after it are not deleted.
    pub async fn remove_multi(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// Returns the valid entries among `keys`, keyed by the requested key.
    ///
    /// Entries are fetched in one batch read, and the tags of all of them are validated in a
    /// second one. Invalidated entries are deleted like in [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a stored value does not decode as `V`.
    pub async fn get_multi<V>(&self, keys: &[&str]) -> Result<HashMap<String, V>>
    where
        V: DeserializeOwned,
    {
        let watch = self.clock.stopwatch();
        let result = self.get_multi_inner(keys).await;
        self.telemetry
            .record_result(self.name, CacheOperation::GetMulti, &result, |_| CacheActivity::Ok, watch.elapsed());
        result
    }

    /// Stores every `(key, value)` pair with the same time-to-live and tags.
    ///
    /// Tags are resolved once for the whole batch.
    ///
    /// # Errors
    ///
    /// Returns an error if any key is empty (before anything is written), or on the first
    /// failed write; entries written before it remain.
    pub async fn set_multi<I, K, V>(&self, values: I, ttl: Option<Duration>, tags: &[&str]) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Serialize,
    {
        let entries: Vec<(K, V)> = values.into_iter().collect();
        for (key, _) in &entries {
            require_key(key.as_ref())?;
        }

        let snapshot = self.tags.snapshot(&self.storage, tags).await?;
        for (key, value) in &entries {
            let watch = self.clock.stopwatch();
            let result = self.write(&self.storage_key(key.as_ref()), value, &snapshot, ttl).await;
            self.telemetry
                .record_result(self.name, CacheOperation::Set, &result, |_| CacheActivity::Stored, watch.elapsed());
            result?;
        }

        Ok(())
    }

    /// Returns the current versions of the existing tags among `names`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_multi_tags(&self, names: &[&str]) -> Result<TagSnapshot> {
        self.tags.versions(&self.storage, names).await
    }

    /// Invalidates every tag in `names` and returns how many existed.
    ///
    /// # Errors
    ///
    /// Returns the first store error; tags after it are not invalidated.
    pub async fn remove_multi_tags(&self, names: &[&str]) -> Result<usize> {
        let unique: BTreeSet<&str> = names.iter().copied().collect();
        let mut invalidated = 0;
        for name in unique {
            if self.remove_tag(name).await? {
                invalidated += 1;
            }
        }
        Ok(invalidated)
    }

    /// Returns the value under `key`, or computes it with `f`, stores it and returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or storing fails. The computed value is lost in that case.
    pub async fn get_or_set<V, F, Fut>(&self, key: &str, ttl: Option<Duration>, tags: &[&str], f: F) -> Result<V>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let value = f().await;
        self.set(key, &value, ttl, tags).await?;
        Ok(value)
    }

    /// Removes every entry and every tag from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn flush(&self) -> Result<()> {
        let watch = self.clock.stopwatch();
        let result = self.storage.clear().await;
        self.telemetry
            .record_result(self.name, CacheOperation::Flush, &result, |_| CacheActivity::Ok, watch.elapsed());
        result
    }

    async fn set_inner<V>(&self, key: &str, value: &V, ttl: Option<Duration>, tags: &[&str]) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        require_key(key)?;
        let snapshot = self.tags.snapshot(&self.storage, tags).await?;
        self.write(&self.storage_key(key), value, &snapshot, ttl).await
    }

    async fn add_inner<V>(&self, key: &str, value: &V, ttl: Option<Duration>, tags: &[&str]) -> Result<bool>
    where
        V: Serialize + ?Sized,
    {
        require_key(key)?;
        let storage_key = self.storage_key(key);
        if let Lookup::Hit(_) = self.lookup::<IgnoredAny>(&storage_key).await? {
            return Ok(false);
        }

        let snapshot = self.tags.snapshot(&self.storage, tags).await?;
        self.write(&storage_key, value, &snapshot, ttl).await?;
        Ok(true)
    }

    async fn increment_inner(&self, key: &str, offset: i64, ttl: Option<Duration>) -> Result<i64> {
        require_key(key)?;
        let storage_key = self.storage_key(key);

        let (next, tags) = match self.lookup::<i64>(&storage_key).await? {
            Lookup::Hit(Envelope { value, tags }) => (
                value
                    .checked_add(offset)
                    .ok_or_else(|| Error::from_message(format!("counter overflow incrementing {key}")))?,
                tags,
            ),
            Lookup::Miss | Lookup::Stale => (offset, TagSnapshot::new()),
        };

        self.write(&storage_key, &next, &tags, ttl).await?;
        Ok(next)
    }

    async fn decrement_inner(&self, key: &str, offset: i64, ttl: Option<Duration>) -> Result<Option<i64>> {
        require_key(key)?;
        let storage_key = self.storage_key(key);

        let Lookup::Hit(Envelope { value, tags }) = self.lookup::<i64>(&storage_key).await? else {
            return Ok(None);
        };

        let next = value
            .checked_sub(offset)
            .ok_or_else(|| Error::from_message(format!("counter overflow decrementing {key}")))?;
        self.write(&storage_key, &next, &tags, ttl).await?;
        Ok(Some(next))
    }

    async fn get_multi_inner<V>(&self, keys: &[&str]) -> Result<HashMap<String, V>>
    where
        V: DeserializeOwned,
    {
        let requested: Vec<(&str, String)> = keys
            .iter()
            .filter(|key| !key.is_empty())
            .map(|key| (*key, self.storage_key(key).into_owned()))
            .collect();
        if requested.is_empty() {
            return Ok(HashMap::new());
        }

        let storage_keys: Vec<String> = requested.iter().map(|(_, storage_key)| storage_key.clone()).collect();
        let mut raw = self.storage.get_many(&storage_keys).await?;

        let mut entries = Vec::with_capacity(raw.len());
        for (key, storage_key) in &requested {
            let Some(bytes) = raw.remove(storage_key) else {
                continue;
            };
            if let Some(envelope) = envelope::decode::<V>(&bytes)? {
                entries.push((*key, storage_key.as_str(), envelope));
            }
        }

        let names: Vec<&str> = entries
            .iter()
            .flat_map(|(_, _, envelope)| envelope.tags.keys().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let current = self.tags.versions(&self.storage, &names).await?;

        let mut found = HashMap::with_capacity(entries.len());
        for (key, storage_key, envelope) in entries {
            if tags::is_satisfied(&envelope.tags, &current) {
                found.insert(key.to_owned(), envelope.value);
            } else {
                self.discard_stale(storage_key).await;
            }
        }

        Ok(found)
    }

    /// Reads the entry under `storage_key` and checks its tags.
    async fn lookup<V>(&self, storage_key: &str) -> Result<Lookup<V>>
    where
        V: DeserializeOwned,
    {
        let Some(raw) = self.storage.get(storage_key).await? else {
            return Ok(Lookup::Miss);
        };
        let Some(envelope) = envelope::decode::<V>(&raw)? else {
            return Ok(Lookup::Miss);
        };

        if self.tags.is_current(&self.storage, &envelope.tags).await? {
            return Ok(Lookup::Hit(envelope));
        }

        self.discard_stale(storage_key).await;
        Ok(Lookup::Stale)
    }

    async fn discard_stale(&self, storage_key: &str) {
        if let Err(error) = self.storage.delete(storage_key).await {
            tracing::warn!(
                cache.name = self.name,
                cache.key = storage_key,
                error = %error,
                "failed to delete invalidated entry"
            );
        }
    }

    async fn write<V>(&self, storage_key: &str, value: &V, tags: &TagSnapshot, ttl: Option<Duration>) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        let payload = envelope::encode(value, tags)?;
        self.storage.set(storage_key, payload, self.effective_ttl(ttl)).await
    }
}
