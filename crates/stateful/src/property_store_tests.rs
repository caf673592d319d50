// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dcc_registry::{MigratorRegistryBuilder, StateMigrator};
use serde_json::json;

struct AddField(u32, &'static str, Value);

impl StateMigrator for AddField {
    fn from_version(&self) -> u32 {
        self.0
    }

    fn migrate(&self, mut state: Value) -> Result<Value, dcc_core::SerializableDeviceFailure> {
        if let Value::Object(map) = &mut state {
            map.insert(self.1.to_string(), self.2.clone());
        }
        Ok(state)
    }
}

#[test]
fn write_then_read_round_trips_the_value() {
    let store = StatefulPropertyStore::new(1);
    store.write("setpoint", json!(21.5));
    assert_eq!(store.read("setpoint"), Some(json!(21.5)));
}

#[test]
fn write_marks_the_store_dirty() {
    let store = StatefulPropertyStore::new(1);
    assert!(!store.dirty_tracker().is_dirty());
    store.write("setpoint", json!(1));
    assert!(store.dirty_tracker().is_dirty());
    assert_eq!(store.dirty_tracker().dirty_version(), 1);
}

#[test]
fn snapshot_captures_current_values_and_version() {
    let store = StatefulPropertyStore::new(2);
    store.write("a", json!(1));
    store.write("b", json!(2));
    let snapshot = store.snapshot();
    assert_eq!(snapshot.version, 2);
    assert_eq!(snapshot.schema_version, 2);
    assert_eq!(snapshot.state, json!({"a": 1, "b": 2}));
}

#[test]
fn restore_applies_state_when_stopped() {
    let store = StatefulPropertyStore::new(1);
    let snapshot = Snapshot::new(5, 1, json!({"a": 10}));
    store.restore(snapshot, LifecycleState::Stopped, &MigratorRegistryBuilder::new().build()).unwrap();
    assert_eq!(store.read("a"), Some(json!(10)));
}

#[test]
fn restore_rejects_when_device_is_running() {
    let store = StatefulPropertyStore::new(1);
    let snapshot = Snapshot::new(1, 1, json!({"a": 1}));
    let result = store.restore(snapshot, LifecycleState::Running, &MigratorRegistryBuilder::new().build());
    assert!(matches!(result, Err(DeviceFault::InvalidState { .. })));
}

#[test]
fn restore_rejects_newer_schema_than_blueprint() {
    let store = StatefulPropertyStore::new(1);
    let snapshot = Snapshot::new(1, 5, json!({}));
    let result = store.restore(snapshot, LifecycleState::Stopped, &MigratorRegistryBuilder::new().build());
    assert!(matches!(result, Err(DeviceFault::InvalidState { .. })));
}

#[test]
fn restore_migrates_older_schema_forward() {
    let mut builder = MigratorRegistryBuilder::new();
    builder.insert(std::sync::Arc::new(AddField(1, "new_field", json!("default"))));
    let store = StatefulPropertyStore::new(2);
    let snapshot = Snapshot::new(1, 1, json!({"a": 1}));
    store.restore(snapshot, LifecycleState::Attaching, &builder.build()).unwrap();
    assert_eq!(store.read("new_field"), Some(json!("default")));
    assert_eq!(store.read("a"), Some(json!(1)));
}

#[test]
fn restore_at_matching_schema_version_applies_without_migration() {
    let store = StatefulPropertyStore::new(3);
    let snapshot = Snapshot::new(1, 3, json!({"a": 1}));
    store.restore(snapshot, LifecycleState::Stopped, &MigratorRegistryBuilder::new().build()).unwrap();
    assert_eq!(store.read("a"), Some(json!(1)));
}
