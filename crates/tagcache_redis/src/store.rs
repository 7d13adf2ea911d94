// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Redis store implementation.

use std::{collections::HashMap, fmt::Debug, time::Duration};

use redis::{Client, Cmd, FromRedisValue, Value, aio::ConnectionManager};
use tagcache_store::{Capabilities, Error, KeyValueStore};

/// Condition attached to a `SET` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetCondition {
    Always,
    IfAbsent,
    IfPresent,
}

/// A key-value store backed by a Redis server.
///
/// All optional primitives map onto single Redis commands:
/// - batch reads use `MGET`
/// - set-if-absent uses `SET .. NX`
/// - replace-if-exists uses `SET .. XX`
///
/// Time-to-live is sent with millisecond precision (`PX`). `clear` issues `FLUSHDB`, which
/// empties the whole logical database the connection points at.
///
/// The store is cheap to clone; clones share one multiplexed connection that reconnects on
/// failure. It must be used from within a Tokio runtime.
///
/// # Examples
///
/// ```no_run
/// use tagcache_redis::RedisStore;
/// use tagcache_store::KeyValueStore;
///
/// # async fn example() -> Result<(), tagcache_store::Error> {
/// let store = RedisStore::connect("redis://127.0.0.1/").await?;
/// store.set("key", b"value".to_vec(), None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Creates a store on top of an existing connection manager.
    #[must_use]
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Opens a connection to the server at `url` and creates a store on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let client = Client::open(url).map_err(Error::from_message)?;
        let connection = ConnectionManager::new(client).await.map_err(Error::from_message)?;
        Ok(Self::new(connection))
    }

    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T, Error> {
        let mut connection = self.connection.clone();
        cmd.query_async(&mut connection).await.map_err(Error::from_message)
    }

    async fn conditional_set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>, condition: SetCondition) -> Result<bool, Error> {
        let reply: Value = self.query(&set_command(key, &value, ttl, condition)).await?;
        Ok(!matches!(reply, Value::Nil))
    }
}

impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.query(&cmd).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), Error> {
        self.query(&set_command(key, &value, ttl, SetCondition::Always)).await
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        let removed: i64 = self.query(&cmd).await?;
        Ok(removed > 0)
    }

    async fn clear(&self) -> Result<(), Error> {
        self.query(&redis::cmd("FLUSHDB")).await
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, Vec<u8>>, Error> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let mut cmd = redis::cmd("MGET");
        cmd.arg(keys);
        let values: Vec<Option<Vec<u8>>> = self.query(&cmd).await?;

        Ok(keys
            .iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|value| (key.clone(), value)))
            .collect())
    }

    async fn add(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<bool, Error> {
        self.conditional_set(key, value, ttl, SetCondition::IfAbsent).await
    }

    async fn replace(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<bool, Error> {
        self.conditional_set(key, value, ttl, SetCondition::IfPresent).await
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            batch_read: true,
            atomic_add: true,
            atomic_replace: true,
        }
    }
}

/// Builds `SET key value [PX millis] [NX|XX]`.
pub(crate) fn set_command(key: &str, value: &[u8], ttl: Option<Duration>, condition: SetCondition) -> Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);

    if let Some(millis) = expiry_millis(ttl) {
        cmd.arg("PX").arg(millis);
    }

    match condition {
        SetCondition::Always => {}
        SetCondition::IfAbsent => {
            cmd.arg("NX");
        }
        SetCondition::IfPresent => {
            cmd.arg("XX");
        }
    }

    cmd
}

/// Redis rejects `PX 0`; a zero ttl means no expiry and sub-millisecond ttls round up.
pub(crate) fn expiry_millis(ttl: Option<Duration>) -> Option<u64> {
    ttl.filter(|ttl| !ttl.is_zero())
        .map(|ttl| u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(cmd: &Cmd) -> String {
        String::from_utf8_lossy(&cmd.get_packed_command()).into_owned()
    }

    #[test]
    fn expiry_millis_treats_zero_as_no_expiry() {
        assert_eq!(expiry_millis(None), None);
        assert_eq!(expiry_millis(Some(Duration::ZERO)), None);
    }

    #[test]
    fn expiry_millis_rounds_sub_millisecond_up() {
        assert_eq!(expiry_millis(Some(Duration::from_micros(10))), Some(1));
        assert_eq!(expiry_millis(Some(Duration::from_secs(2))), Some(2000));
    }

    #[test]
    fn set_command_without_ttl_or_condition() {
        let cmd = packed(&set_command("key", b"value", None, SetCondition::Always));
        assert!(cmd.contains("SET"));
        assert!(cmd.contains("key"));
        assert!(cmd.contains("value"));
        assert!(!cmd.contains("PX"));
        assert!(!cmd.contains("NX"));
        assert!(!cmd.contains("XX"));
    }

    #[test]
    fn set_command_with_ttl_and_conditions() {
        let add = packed(&set_command("tag:foo", b"1", Some(Duration::from_secs(5)), SetCondition::IfAbsent));
        assert!(add.contains("PX"));
        assert!(add.contains("5000"));
        assert!(add.ends_with("NX\r\n"));

        let replace = packed(&set_command("tag:foo", b"2", None, SetCondition::IfPresent));
        assert!(replace.ends_with("XX\r\n"));
    }
}
