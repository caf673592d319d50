// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn shared_read_locks_co_hold() {
    let manager = LockManager::new();
    let specs = vec![ResourceLockSpec { resource_id: "sensor-1".into(), mode: LockMode::SharedRead }];
    let _a = manager.acquire(&specs).await;
    // Should not deadlock: a second shared reader can also acquire.
    let b = tokio::time::timeout(Duration::from_millis(200), manager.acquire(&specs)).await;
    assert!(b.is_ok());
}

#[tokio::test]
async fn exclusive_write_excludes_concurrent_readers() {
    let manager = Arc::new(LockManager::new());
    let specs = vec![ResourceLockSpec { resource_id: "sensor-1".into(), mode: LockMode::ExclusiveWrite }];
    let _writer = manager.acquire(&specs).await;

    let manager2 = manager.clone();
    let specs2 = specs.clone();
    let blocked = tokio::time::timeout(Duration::from_millis(100), manager2.acquire(&specs2)).await;
    assert!(blocked.is_err(), "exclusive lock should block a second acquirer");
}

#[tokio::test]
async fn dropping_guard_set_releases_locks() {
    let manager = LockManager::new();
    let specs = vec![ResourceLockSpec { resource_id: "sensor-1".into(), mode: LockMode::ExclusiveWrite }];
    {
        let _guard = manager.acquire(&specs).await;
    }
    let reacquired = tokio::time::timeout(Duration::from_millis(200), manager.acquire(&specs)).await;
    assert!(reacquired.is_ok());
}

#[tokio::test]
async fn sorted_dedup_acquisition_handles_duplicate_specs() {
    let manager = LockManager::new();
    let specs = vec![
        ResourceLockSpec { resource_id: "a".into(), mode: LockMode::ExclusiveWrite },
        ResourceLockSpec { resource_id: "a".into(), mode: LockMode::ExclusiveWrite },
        ResourceLockSpec { resource_id: "b".into(), mode: LockMode::SharedRead },
    ];
    let guard = tokio::time::timeout(Duration::from_millis(200), manager.acquire(&specs)).await;
    assert!(guard.is_ok(), "duplicate locks on the same resource must not self-deadlock");
}
