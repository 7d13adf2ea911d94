// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tag bookkeeping on top of a key-value store.
//!
//! Each tag lives under its own key, `<prefix><name>`, holding the tag's current
//! [`TagVersion`]. Tags never expire on their own.

use std::collections::BTreeSet;

use tagcache_store::KeyValueStore;
use tick::Clock;

use crate::{Result, TagVersion, envelope::TagSnapshot};

/// Reads, creates and invalidates tag versions.
///
/// A tag whose stored value is not a decimal version is treated as absent.
#[derive(Debug, Clone)]
pub(crate) struct TagStore {
    prefix: String,
    clock: Clock,
}

impl TagStore {
    pub(crate) fn new(prefix: impl Into<String>, clock: Clock) -> Self {
        Self {
            prefix: prefix.into(),
            clock,
        }
    }

    pub(crate) fn key(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    /// Reads the current versions of `names` in one batch. Absent tags are omitted.
    pub(crate) async fn versions<S: KeyValueStore>(&self, store: &S, names: &[&str]) -> Result<TagSnapshot> {
        if names.is_empty() {
            return Ok(TagSnapshot::new());
        }

        let keys: Vec<String> = names.iter().map(|name| self.key(name)).collect();
        let raw = store.get_many(&keys).await?;

        Ok(names
            .iter()
            .zip(&keys)
            .filter_map(|(name, key)| {
                let version = TagVersion::decode(raw.get(key)?)?;
                Some(((*name).to_owned(), version))
            })
            .collect())
    }

    pub(crate) async fn version<S: KeyValueStore>(&self, store: &S, name: &str) -> Result<Option<TagVersion>> {
        Ok(store.get(&self.key(name)).await?.as_deref().and_then(TagVersion::decode))
    }

    /// Resolves the version of every tag in `names`, creating the missing ones.
    ///
    /// Existing versions are reused verbatim so sibling entries share them. Duplicate names
    /// collapse into one snapshot entry.
    pub(crate) async fn snapshot<S: KeyValueStore>(&self, store: &S, names: &[&str]) -> Result<TagSnapshot> {
        let unique: Vec<&str> = names.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let mut snapshot = self.versions(store, &unique).await?;

        for name in unique {
            if !snapshot.contains_key(name) {
                let version = self.create(store, name).await?;
                snapshot.insert(name.to_owned(), version);
            }
        }

        Ok(snapshot)
    }

    /// Creates a missing tag and returns the version that ended up stored.
    async fn create<S: KeyValueStore>(&self, store: &S, name: &str) -> Result<TagVersion> {
        let key = self.key(name);
        let generated = TagVersion::now(&self.clock);

        if store.add(&key, generated.encode(), None).await? {
            return Ok(generated);
        }

        // Another writer created the tag first; adopt its version.
        if let Some(stored) = store.get(&key).await?.as_deref().and_then(TagVersion::decode) {
            return Ok(stored);
        }

        // The winner's tag vanished or holds garbage.
        store.set(&key, generated.encode(), None).await?;
        Ok(generated)
    }

    /// Checks `snapshot` against the current tag versions in one batch read.
    pub(crate) async fn is_current<S: KeyValueStore>(&self, store: &S, snapshot: &TagSnapshot) -> Result<bool> {
        if snapshot.is_empty() {
            return Ok(true);
        }

        let names: Vec<&str> = snapshot.keys().map(String::as_str).collect();
        let current = self.versions(store, &names).await?;
        Ok(is_satisfied(snapshot, &current))
    }

    /// Moves the tag to a version newer than every snapshot taken so far.
    ///
    /// Returns `false` when the tag does not exist or disappeared before the replace landed.
    pub(crate) async fn invalidate<S: KeyValueStore>(&self, store: &S, name: &str) -> Result<bool> {
        let Some(current) = self.version(store, name).await? else {
            return Ok(false);
        };

        let next = current.successor(TagVersion::now(&self.clock));
        store.replace(&self.key(name), next.encode(), None).await
    }
}

/// An entry is current when each of its tags still exists at a version no newer than the one
/// it was written against.
pub(crate) fn is_satisfied(snapshot: &TagSnapshot, current: &TagSnapshot) -> bool {
    snapshot
        .iter()
        .all(|(name, written)| current.get(name).is_some_and(|now| now <= written))
}
