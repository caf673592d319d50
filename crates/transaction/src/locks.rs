// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource locks: a leaf or action's `requiredLocks` are
//! acquired in name-sorted order before execution to avoid deadlock
//! between concurrently executing plans, and released on every exit path
//! including cancellation (`Drop` on the returned guard set handles that).

use dcc_core::{LockMode, ResourceLockSpec};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Process-lifetime (well: coordinator-lifetime) map of resource id to its
/// lock. New resources are created lazily on first reference.
#[derive(Default)]
pub struct LockManager {
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

enum Held {
    Read(OwnedRwLockReadGuard<()>),
    Write(OwnedRwLockWriteGuard<()>),
}

/// Holds every lock acquired for one node's execution; dropping releases
/// them all, in no particular order (tokio's `RwLock` doesn't care).
#[must_use]
pub struct LockGuardSet(Vec<Held>);

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_create(&self, resource_id: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock();
        locks.entry(resource_id.to_string()).or_insert_with(|| Arc::new(RwLock::new(()))).clone()
    }

    /// Acquire every lock in `specs`, sorted by `(resource_id, mode)` first
    /// so two plans racing for the same resource set always request in the
    /// same order.
    pub async fn acquire(&self, specs: &[ResourceLockSpec]) -> LockGuardSet {
        let mut sorted = specs.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut held = Vec::with_capacity(sorted.len());
        for spec in &sorted {
            let lock = self.get_or_create(&spec.resource_id);
            let guard = match spec.mode {
                LockMode::SharedRead => Held::Read(lock.read_owned().await),
                LockMode::ExclusiveWrite => Held::Write(lock.write_owned().await),
            };
            held.push(guard);
        }
        LockGuardSet(held)
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
