// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `InMemoryStore`.

use std::time::Duration;

use tagcache_memory::{InMemoryStore, InMemoryStoreBuilder};
use tagcache_store::{Capabilities, KeyValueStore};

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

#[test]
fn get_returns_none_for_missing_key() {
    block_on(async {
        let store = InMemoryStore::new();
        assert!(store.get("missing").await.expect("get failed").is_none());
    });
}

#[test]
fn set_and_get_returns_value() {
    block_on(async {
        let store = InMemoryStore::new();
        store.set("key", b"value".to_vec(), None).await.expect("set failed");
        assert_eq!(store.get("key").await.expect("get failed"), Some(b"value".to_vec()));
    });
}

#[test]
fn set_overwrites_existing_value() {
    block_on(async {
        let store = InMemoryStore::new();
        store.set("key", b"old".to_vec(), None).await.expect("set failed");
        store.set("key", b"new".to_vec(), None).await.expect("set failed");
        assert_eq!(store.get("key").await.expect("get failed"), Some(b"new".to_vec()));
    });
}

#[test]
fn delete_reports_whether_key_existed() {
    block_on(async {
        let store = InMemoryStore::new();
        store.set("key", b"value".to_vec(), None).await.expect("set failed");

        assert!(store.delete("key").await.expect("delete failed"));
        assert!(!store.delete("key").await.expect("delete failed"));
        assert!(store.get("key").await.expect("get failed").is_none());
    });
}

#[test]
fn clear_removes_all_values() {
    block_on(async {
        let store = InMemoryStore::new();
        store.set("a", b"1".to_vec(), None).await.expect("set failed");
        store.set("b", b"2".to_vec(), None).await.expect("set failed");

        store.clear().await.expect("clear failed");

        assert!(store.get("a").await.expect("get failed").is_none());
        assert!(store.get("b").await.expect("get failed").is_none());
    });
}

#[test]
fn add_writes_only_when_absent() {
    block_on(async {
        let store = InMemoryStore::new();

        assert!(store.add("tag:foo", b"100".to_vec(), None).await.expect("add failed"));
        assert!(!store.add("tag:foo", b"200".to_vec(), None).await.expect("add failed"));
        assert_eq!(store.get("tag:foo").await.expect("get failed"), Some(b"100".to_vec()));
    });
}

#[test]
fn replace_writes_only_when_present() {
    block_on(async {
        let store = InMemoryStore::new();

        assert!(!store.replace("tag:foo", b"100".to_vec(), None).await.expect("replace failed"));
        assert!(store.get("tag:foo").await.expect("get failed").is_none());

        store.set("tag:foo", b"100".to_vec(), None).await.expect("set failed");
        assert!(store.replace("tag:foo", b"200".to_vec(), None).await.expect("replace failed"));
        assert_eq!(store.get("tag:foo").await.expect("get failed"), Some(b"200".to_vec()));
    });
}

#[test]
fn get_many_returns_present_keys_only() {
    block_on(async {
        let store = InMemoryStore::new();
        store.set("a", b"1".to_vec(), None).await.expect("set failed");
        store.set("b", b"2".to_vec(), None).await.expect("set failed");

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let found = store.get_many(&keys).await.expect("get_many failed");

        assert_eq!(found.len(), 2);
        assert_eq!(found.get("b"), Some(&b"2".to_vec()));
    });
}

#[test]
fn value_expires_after_its_ttl() {
    block_on(async {
        let store = InMemoryStore::new();
        store
            .set("short", b"x".to_vec(), Some(Duration::from_millis(50)))
            .await
            .expect("set failed");
        store.set("forever", b"y".to_vec(), None).await.expect("set failed");

        std::thread::sleep(Duration::from_millis(150));

        assert!(store.get("short").await.expect("get failed").is_none());
        assert_eq!(store.get("forever").await.expect("get failed"), Some(b"y".to_vec()));
    });
}

#[test]
fn overwrite_without_ttl_clears_previous_expiry() {
    block_on(async {
        let store = InMemoryStore::new();
        store
            .set("key", b"x".to_vec(), Some(Duration::from_millis(50)))
            .await
            .expect("set failed");
        store.set("key", b"y".to_vec(), None).await.expect("set failed");

        std::thread::sleep(Duration::from_millis(150));

        assert_eq!(store.get("key").await.expect("get failed"), Some(b"y".to_vec()));
    });
}

#[test]
fn clones_share_data() {
    block_on(async {
        let store = InMemoryStore::new();
        let clone = store.clone();

        store.set("key", b"shared".to_vec(), None).await.expect("set failed");
        assert_eq!(clone.get("key").await.expect("get failed"), Some(b"shared".to_vec()));
    });
}

#[test]
fn reports_native_atomic_capabilities() {
    let store = InMemoryStore::default();
    assert_eq!(
        store.capabilities(),
        Capabilities {
            batch_read: false,
            atomic_add: true,
            atomic_replace: true,
        }
    );
}

#[test]
fn builder_configures_bounded_store() {
    block_on(async {
        let store = InMemoryStoreBuilder::new()
            .max_capacity(10)
            .initial_capacity(4)
            .name("bounded")
            .build();

        store.set("key", b"v".to_vec(), None).await.expect("set failed");
        assert_eq!(store.get("key").await.expect("get failed"), Some(b"v".to_vec()));

        let with_capacity = InMemoryStore::with_capacity(10);
        assert!(with_capacity.get("key").await.expect("get failed").is_none());
    });
}
