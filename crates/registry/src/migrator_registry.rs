// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The schema migrator registry: dispatches a
//! persisted property-state blob from its recorded `schema_version` to the
//! current one, one step at a time, via a chain of registered
//! per-version migrators.

use dcc_core::{DeviceFault, SerializableDeviceFailure};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Migrates a state blob from `from_version` to `from_version + 1`.
pub trait StateMigrator: Send + Sync {
    fn from_version(&self) -> u32;
    fn migrate(&self, state: Value) -> Result<Value, SerializableDeviceFailure>;
}

/// Frozen `from_version -> migrator` chain, keyed by the version each
/// migrator upgrades *from*.
#[derive(Clone, Default)]
pub struct MigratorRegistry {
    by_from_version: Arc<HashMap<u32, Arc<dyn StateMigrator>>>,
}

#[derive(Default)]
pub struct MigratorRegistryBuilder {
    by_from_version: HashMap<u32, Arc<dyn StateMigrator>>,
}

impl MigratorRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, migrator: Arc<dyn StateMigrator>) -> &mut Self {
        self.by_from_version.insert(migrator.from_version(), migrator);
        self
    }

    pub fn build(self) -> MigratorRegistry {
        MigratorRegistry { by_from_version: Arc::new(self.by_from_version) }
    }
}

impl MigratorRegistry {
    /// Walk the chain of registered migrators from `current_version` up to
    /// `target_version`, one step at a time. Returns
    /// `DeviceFault::InvalidState` (an incompatible-schema fault) if any
    /// required step has no registered migrator.
    pub fn migrate(&self, mut state: Value, current_version: u32, target_version: u32) -> Result<Value, DeviceFault> {
        if current_version > target_version {
            return Err(incompatible(current_version, target_version));
        }
        let mut version = current_version;
        while version < target_version {
            let migrator = self.by_from_version.get(&version).ok_or_else(|| incompatible(current_version, target_version))?;
            state = migrator.migrate(state).map_err(|failure| DeviceFault::Generic {
                code: "MIGRATION_FAILED".into(),
                message: failure.to_string(),
                details: Value::Null,
            })?;
            version += 1;
        }
        Ok(state)
    }
}

fn incompatible(current_version: u32, target_version: u32) -> DeviceFault {
    DeviceFault::InvalidState {
        current_state: format!("schema_version={current_version}"),
        required_state: format!("schema_version={target_version}"),
        operation: "restore".into(),
    }
}

#[cfg(test)]
#[path = "migrator_registry_tests.rs"]
mod tests;
