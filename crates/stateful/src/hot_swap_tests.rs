// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::property_store::StatefulPropertyStore;
use dcc_core::LifecycleState;
use dcc_registry::MigratorRegistryBuilder;
use serde_json::json;
use std::sync::Arc;

struct AddField(u32, &'static str, serde_json::Value);

impl dcc_registry::StateMigrator for AddField {
    fn from_version(&self) -> u32 {
        self.0
    }

    fn migrate(&self, mut state: serde_json::Value) -> Result<serde_json::Value, dcc_core::SerializableDeviceFailure> {
        if let serde_json::Value::Object(map) = &mut state {
            map.insert(self.1.to_string(), self.2.clone());
        }
        Ok(state)
    }
}

#[test]
fn same_schema_version_passes_through_unmigrated() {
    let old = StatefulPropertyStore::new(2);
    old.write("a", json!(1));
    let migrators = MigratorRegistryBuilder::new().build();
    let snapshot = prepare_migrated_snapshot(&old, 2, &migrators).unwrap();
    assert_eq!(snapshot.state, json!({"a": 1}));
    assert_eq!(snapshot.schema_version, 2);
}

#[test]
fn older_schema_version_is_migrated_before_restore() {
    let old = StatefulPropertyStore::new(1);
    old.write("a", json!(1));

    let mut builder = MigratorRegistryBuilder::new();
    builder.insert(Arc::new(AddField(1, "b", json!("default"))));
    let migrators = builder.build();

    let migrated = prepare_migrated_snapshot(&old, 2, &migrators).unwrap();
    assert_eq!(migrated.schema_version, 2);

    let new_store = StatefulPropertyStore::new(2);
    new_store.restore(migrated, LifecycleState::Attaching, &migrators).unwrap();
    assert_eq!(new_store.read("a"), Some(json!(1)));
    assert_eq!(new_store.read("b"), Some(json!("default")));
}

#[test]
fn missing_migrator_fails_the_hot_swap() {
    let old = StatefulPropertyStore::new(1);
    old.write("a", json!(1));
    let migrators = MigratorRegistryBuilder::new().build();
    let result = prepare_migrated_snapshot(&old, 2, &migrators);
    assert!(result.is_err());
}
