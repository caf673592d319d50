// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-device store of `persistent` property values:
//! `write()` mutates a value and triggers the device's `markDirty`;
//! `snapshot()`/`restore()` serialize/apply the whole set atomically with
//! respect to concurrent writes by sharing one `RwLock` between the value
//! map and the dirty-version bump.

use crate::dirty::DirtyTracker;
use crate::snapshot::Snapshot;
use dcc_core::{DeviceFault, LifecycleState};
use dcc_registry::MigratorRegistry;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

struct Properties {
    values: IndexMap<String, Value>,
    blobs: HashMap<String, Vec<u8>>,
}

/// Owns every `persistent` property's current value for one device
/// instance, plus the dirty-version counter guarding snapshot consistency.
pub struct StatefulPropertyStore {
    schema_version: u32,
    properties: RwLock<Properties>,
    dirty: DirtyTracker,
}

impl StatefulPropertyStore {
    pub fn new(schema_version: u32) -> Self {
        Self {
            schema_version,
            properties: RwLock::new(Properties { values: IndexMap::new(), blobs: HashMap::new() }),
            dirty: DirtyTracker::new(),
        }
    }

    pub fn dirty_tracker(&self) -> &DirtyTracker {
        &self.dirty
    }

    pub fn read(&self, name: &str) -> Option<Value> {
        self.properties.read().values.get(name).cloned()
    }

    /// Mutates `name` and marks the store dirty. Both happen while holding
    /// the write lock, so a concurrent `snapshot()` (which takes the read
    /// lock) always observes the value and the bumped version together,
    /// never one without the other.
    pub fn write(&self, name: impl Into<String>, value: Value) -> u64 {
        let mut properties = self.properties.write();
        properties.values.insert(name.into(), value);
        self.dirty.mark_dirty()
    }

    pub fn snapshot(&self) -> Snapshot {
        let properties = self.properties.read();
        let state = Value::Object(properties.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        Snapshot::new(self.dirty.dirty_version(), self.schema_version, state).with_blobs(properties.blobs.clone())
    }

    /// Applies a snapshot, migrating its state forward if its
    /// `schema_version` lags the store's own.
    ///
    /// Only legal while the owning device is `Stopped` or `Attaching`;
    /// `current_state` is supplied by the caller (`dcc-runtime`) rather
    /// than tracked here, keeping this crate decoupled from the lifecycle
    /// FSM's ownership.
    pub fn restore(&self, snapshot: Snapshot, current_state: LifecycleState, migrators: &MigratorRegistry) -> Result<(), DeviceFault> {
        if !matches!(current_state, LifecycleState::Stopped | LifecycleState::Attaching) {
            return Err(DeviceFault::InvalidState {
                current_state: current_state.to_string(),
                required_state: "stopped or attaching".into(),
                operation: "restore".into(),
            });
        }
        if snapshot.schema_version > self.schema_version {
            return Err(DeviceFault::InvalidState {
                current_state: format!("schema_version={}", snapshot.schema_version),
                required_state: format!("schema_version<={}", self.schema_version),
                operation: "restore".into(),
            });
        }

        let state = if snapshot.schema_version < self.schema_version {
            migrators.migrate(snapshot.state, snapshot.schema_version, self.schema_version)?
        } else {
            snapshot.state
        };

        let values = match state {
            Value::Object(map) => map.into_iter().collect::<IndexMap<_, _>>(),
            other => {
                return Err(DeviceFault::ValidationError {
                    message: format!("restored state must be a JSON object, got {other}"),
                })
            }
        };

        let mut properties = self.properties.write();
        properties.values = values;
        properties.blobs = snapshot.blobs;
        Ok(())
    }
}

#[cfg(test)]
#[path = "property_store_tests.rs"]
mod tests;
