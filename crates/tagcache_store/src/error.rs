// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for store and cache operations.

/// An error from a store or cache operation.
///
/// Backend adapters wrap their client errors in it, and the tag-versioning layer uses it for
/// failed writes, undecodable payloads and invalid arguments. A cache miss is never an error.
///
/// Use [`std::error::Error::source()`] to reach the underlying cause.
///
/// # Example
///
/// ```
/// use tagcache_store::Error;
///
/// let error = Error::from_message("connection refused");
/// assert!(error.to_string().contains("connection refused"));
/// ```
#[ohno::error]
pub struct Error {}

impl Error {
    /// Creates a new error from a message or any error type.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagcache_store::Error;
    ///
    /// let io = std::io::Error::other("socket closed");
    /// let error = Error::from_message(io);
    /// ```
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }

    /// Creates an error for an argument the caller should never have passed.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagcache_store::Error;
    ///
    /// let error = Error::invalid_argument("cache key must not be empty");
    /// assert!(error.to_string().contains("invalid argument"));
    /// ```
    #[must_use]
    pub fn invalid_argument(reason: &str) -> Self {
        Self::caused_by(format!("invalid argument: {reason}"))
    }
}

/// A specialized [`Result`] type for store and cache operations.
pub type Result<T> = std::result::Result<T, Error>;
