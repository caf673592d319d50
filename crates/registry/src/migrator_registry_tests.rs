// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

struct AddField(u32, &'static str, Value);

impl StateMigrator for AddField {
    fn from_version(&self) -> u32 {
        self.0
    }

    fn migrate(&self, mut state: Value) -> Result<Value, SerializableDeviceFailure> {
        state.as_object_mut().unwrap().insert(self.1.to_string(), self.2.clone());
        Ok(state)
    }
}

#[test]
fn migrate_walks_the_chain_one_step_at_a_time() {
    let mut builder = MigratorRegistryBuilder::new();
    builder.insert(Arc::new(AddField(1, "b", json!(true))));
    builder.insert(Arc::new(AddField(2, "c", json!(true))));
    let registry = builder.build();

    let result = registry.migrate(json!({"a": 1}), 1, 3).unwrap();
    assert_eq!(result, json!({"a": 1, "b": true, "c": true}));
}

#[test]
fn missing_step_is_incompatible_schema() {
    let registry = MigratorRegistryBuilder::new().build();
    let err = registry.migrate(json!({}), 1, 2).unwrap_err();
    assert_eq!(err.code(), "INVALID_STATE");
}

#[test]
fn current_newer_than_target_is_incompatible() {
    let registry = MigratorRegistryBuilder::new().build();
    assert!(registry.migrate(json!({}), 3, 1).is_err());
}

#[test]
fn no_op_when_already_at_target_version() {
    let registry = MigratorRegistryBuilder::new().build();
    let result = registry.migrate(json!({"a": 1}), 2, 2).unwrap();
    assert_eq!(result, json!({"a": 1}));
}
