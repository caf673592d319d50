// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn snapshot(version: u64) -> Snapshot {
    Snapshot::new(version, 1, json!({"temp": 21}))
}

#[tokio::test]
async fn load_before_any_save_returns_none() {
    let store = InMemorySnapshotStore::new();
    assert_eq!(store.load("boiler-1").await, None);
}

#[tokio::test]
async fn save_then_load_returns_the_latest_snapshot() {
    let store = InMemorySnapshotStore::new();
    store.save("boiler-1", &snapshot(1)).await;
    store.save("boiler-1", &snapshot(2)).await;
    assert_eq!(store.load("boiler-1").await, Some(snapshot(2)));
}

#[tokio::test]
async fn delete_clears_the_entry() {
    let store = InMemorySnapshotStore::new();
    store.save("boiler-1", &snapshot(1)).await;
    store.delete("boiler-1").await;
    assert_eq!(store.load("boiler-1").await, None);
}

#[tokio::test]
async fn entries_are_independent_per_device() {
    let store = InMemorySnapshotStore::new();
    store.save("boiler-1", &snapshot(1)).await;
    store.save("pump-1", &snapshot(7)).await;
    assert_eq!(store.load("boiler-1").await, Some(snapshot(1)));
    assert_eq!(store.load("pump-1").await, Some(snapshot(7)));
}
