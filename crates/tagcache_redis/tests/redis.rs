// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests against a live Redis server.
//!
//! Run with `cargo test -p tagcache_redis -- --ignored` and `REDIS_URL` pointing at a
//! disposable database; the tests flush it.

use std::time::Duration;

use tagcache_redis::RedisStore;
use tagcache_store::KeyValueStore;

async fn connect() -> RedisStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/15".to_string());
    let store = RedisStore::connect(&url).await.expect("failed to connect to redis");
    store.clear().await.expect("flush failed");
    store
}

#[tokio::test]
#[ignore = "requires a running redis server"]
async fn set_get_delete_round_trip() {
    let store = connect().await;

    store.set("key", b"value".to_vec(), None).await.expect("set failed");
    assert_eq!(store.get("key").await.expect("get failed"), Some(b"value".to_vec()));

    assert!(store.delete("key").await.expect("delete failed"));
    assert!(!store.delete("key").await.expect("delete failed"));
    assert!(store.get("key").await.expect("get failed").is_none());
}

#[tokio::test]
#[ignore = "requires a running redis server"]
async fn add_and_replace_are_conditional() {
    let store = connect().await;

    assert!(!store.replace("tag:foo", b"1".to_vec(), None).await.expect("replace failed"));
    assert!(store.add("tag:foo", b"1".to_vec(), None).await.expect("add failed"));
    assert!(!store.add("tag:foo", b"2".to_vec(), None).await.expect("add failed"));
    assert!(store.replace("tag:foo", b"3".to_vec(), None).await.expect("replace failed"));
    assert_eq!(store.get("tag:foo").await.expect("get failed"), Some(b"3".to_vec()));
}

#[tokio::test]
#[ignore = "requires a running redis server"]
async fn get_many_uses_one_round_trip_and_omits_missing() {
    let store = connect().await;
    store.set("a", b"1".to_vec(), None).await.expect("set failed");
    store.set("c", b"3".to_vec(), None).await.expect("set failed");

    let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let found = store.get_many(&keys).await.expect("get_many failed");

    assert_eq!(found.len(), 2);
    assert_eq!(found.get("c"), Some(&b"3".to_vec()));
    assert!(store.get_many(&[]).await.expect("get_many failed").is_empty());
}

#[tokio::test]
#[ignore = "requires a running redis server"]
async fn values_expire() {
    let store = connect().await;
    store
        .set("short", b"x".to_vec(), Some(Duration::from_millis(50)))
        .await
        .expect("set failed");

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(store.get("short").await.expect("get failed").is_none());
}
