// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache telemetry: structured logs through `tracing` and, with the `metrics` feature,
//! OpenTelemetry metrics.
//!
//! Nothing is recorded unless a [`TelemetryConfig`] is passed to the cache builder.

use cache::CacheTelemetryInner;
use thread_aware::{Arc, PerCore};
use tracing::Level;

pub(crate) mod attributes;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod ext;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

pub use config::TelemetryConfig;

/// Telemetry collector shared by all clones of a cache.
#[derive(Clone, Debug)]
pub(crate) struct CacheTelemetry {
    inner: Arc<CacheTelemetryInner, PerCore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Get,
    GetMulti,
    Has,
    Set,
    Add,
    Increment,
    Decrement,
    Remove,
    GetTag,
    RemoveTag,
    Flush,
}

impl CacheOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::GetMulti => "cache.get_multi",
            Self::Has => "cache.has",
            Self::Set => "cache.set",
            Self::Add => "cache.add",
            Self::Increment => "cache.increment",
            Self::Decrement => "cache.decrement",
            Self::Remove => "cache.remove",
            Self::GetTag => "cache.get_tag",
            Self::RemoveTag => "cache.remove_tag",
            Self::Flush => "cache.flush",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    Miss,
    /// The entry was found but one of its tags had moved on.
    Stale,
    Stored,
    /// A conditional write found its precondition unmet.
    Skipped,
    Removed,
    Invalidated,
    Ok,
    Error,
}

impl CacheActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::Stale => "cache.stale",
            Self::Stored => "cache.stored",
            Self::Skipped => "cache.skipped",
            Self::Removed => "cache.removed",
            Self::Invalidated => "cache.invalidated",
            Self::Ok => "cache.ok",
            Self::Error => "cache.error",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::Hit | Self::Miss | Self::Skipped | Self::Ok => Level::DEBUG,
            Self::Stale | Self::Stored | Self::Removed | Self::Invalidated => Level::INFO,
            Self::Error => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_operation_as_str() {
        assert_eq!(CacheOperation::Get.as_str(), "cache.get");
        assert_eq!(CacheOperation::GetMulti.as_str(), "cache.get_multi");
        assert_eq!(CacheOperation::Has.as_str(), "cache.has");
        assert_eq!(CacheOperation::Set.as_str(), "cache.set");
        assert_eq!(CacheOperation::Add.as_str(), "cache.add");
        assert_eq!(CacheOperation::Increment.as_str(), "cache.increment");
        assert_eq!(CacheOperation::Decrement.as_str(), "cache.decrement");
        assert_eq!(CacheOperation::Remove.as_str(), "cache.remove");
        assert_eq!(CacheOperation::GetTag.as_str(), "cache.get_tag");
        assert_eq!(CacheOperation::RemoveTag.as_str(), "cache.remove_tag");
        assert_eq!(CacheOperation::Flush.as_str(), "cache.flush");
    }

    #[test]
    fn cache_activity_as_str() {
        assert_eq!(CacheActivity::Hit.as_str(), "cache.hit");
        assert_eq!(CacheActivity::Miss.as_str(), "cache.miss");
        assert_eq!(CacheActivity::Stale.as_str(), "cache.stale");
        assert_eq!(CacheActivity::Stored.as_str(), "cache.stored");
        assert_eq!(CacheActivity::Skipped.as_str(), "cache.skipped");
        assert_eq!(CacheActivity::Removed.as_str(), "cache.removed");
        assert_eq!(CacheActivity::Invalidated.as_str(), "cache.invalidated");
        assert_eq!(CacheActivity::Ok.as_str(), "cache.ok");
        assert_eq!(CacheActivity::Error.as_str(), "cache.error");
    }

    #[test]
    fn cache_activity_levels() {
        assert_eq!(CacheActivity::Hit.level(), Level::DEBUG);
        assert_eq!(CacheActivity::Miss.level(), Level::DEBUG);
        assert_eq!(CacheActivity::Skipped.level(), Level::DEBUG);
        assert_eq!(CacheActivity::Ok.level(), Level::DEBUG);

        assert_eq!(CacheActivity::Stale.level(), Level::INFO);
        assert_eq!(CacheActivity::Stored.level(), Level::INFO);
        assert_eq!(CacheActivity::Removed.level(), Level::INFO);
        assert_eq!(CacheActivity::Invalidated.level(), Level::INFO);

        assert_eq!(CacheActivity::Error.level(), Level::ERROR);
    }
}
