// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence: `save`/`load`/`delete` a
//! device's latest [`Snapshot`], kept as a trait so a hub can be backed by
//! whatever store fits its deployment, same seam shape as
//! [`ActionSink`](dcc_transaction::ActionSink).

use async_trait::async_trait;
use dcc_stateful::Snapshot;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, device_name: &str, snapshot: &Snapshot);

    async fn load(&self, device_name: &str) -> Option<Snapshot>;

    async fn delete(&self, device_name: &str);
}

/// An in-process, non-persistent [`SnapshotStore`] — the default for a
/// single-process hub that doesn't need snapshots to survive a restart.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    entries: parking_lot::RwLock<std::collections::HashMap<String, Snapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, device_name: &str, snapshot: &Snapshot) {
        self.entries.write().insert(device_name.to_string(), snapshot.clone());
    }

    async fn load(&self, device_name: &str) -> Option<Snapshot> {
        self.entries.read().get(device_name).cloned()
    }

    async fn delete(&self, device_name: &str) {
        self.entries.write().remove(device_name);
    }
}

#[cfg(test)]
#[path = "snapshot_store_tests.rs"]
mod tests;
