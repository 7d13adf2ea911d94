// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tag versions.

use std::{fmt, time::UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tick::Clock;

/// The version of a tag: microseconds since the UNIX epoch at which the tag was created or
/// last invalidated.
///
/// Every tagged entry stores the version each of its tags had when it was written. The entry
/// is valid while none of those tags has moved to a strictly greater version.
///
/// In the store a version is kept as its ASCII decimal representation, so it can be inspected
/// or written by other clients sharing the keyspace.
///
/// # Examples
///
/// ```
/// use tagcache::TagVersion;
///
/// let version = TagVersion::from_micros(1_712_345_678_123_456);
/// assert_eq!(version.to_string(), "1712345678123456");
/// assert!(TagVersion::from_micros(2) > TagVersion::from_micros(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagVersion(u64);

impl TagVersion {
    /// Creates a version from a microsecond timestamp.
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Returns the version as microseconds since the UNIX epoch.
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Returns the version for the current time of `clock`.
    ///
    /// A clock set before the epoch yields version zero.
    #[must_use]
    pub fn now(clock: &Clock) -> Self {
        let micros = clock
            .system_time()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));
        Self(micros)
    }

    /// Returns the version that invalidates `self`: `now`, or one microsecond past `self`
    /// when the clock has not moved beyond it.
    #[must_use]
    pub(crate) fn successor(self, now: Self) -> Self {
        now.max(Self(self.0.saturating_add(1)))
    }

    pub(crate) fn encode(self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }

    /// Parses the stored representation, returning `None` when it is not a decimal integer.
    pub(crate) fn decode(raw: &[u8]) -> Option<Self> {
        std::str::from_utf8(raw).ok()?.trim().parse().ok().map(Self)
    }
}

impl fmt::Display for TagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
