// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hot-swap upgrade of a running device to a new blueprint version
//!. This crate owns the pure data-transform
//! steps (snapshot the old store, migrate its state to the new schema
//! version); instantiating the replacement device `Attaching`, restoring
//! the migrated snapshot onto it, and atomically swapping the hub's
//! reference are orchestrated by `dcc-runtime`/`dcc-hub`, which own device
//! identity and hub wiring this crate deliberately doesn't know about.

use crate::property_store::StatefulPropertyStore;
use crate::snapshot::Snapshot;
use dcc_core::DeviceFault;
use dcc_registry::MigratorRegistry;

/// Steps 1 and 3 of the five-step hot-swap sequence: snapshot the old
/// device's stateful properties, then migrate that snapshot's state from
/// the old schema version to `target_schema_version`. The caller applies
/// the returned snapshot to the newly instantiated device via
/// `StatefulPropertyStore::restore` (step 4) while it sits in `Attaching`.
pub fn prepare_migrated_snapshot(
    old: &StatefulPropertyStore,
    target_schema_version: u32,
    migrators: &MigratorRegistry,
) -> Result<Snapshot, DeviceFault> {
    let snapshot = old.snapshot();
    if snapshot.schema_version == target_schema_version {
        return Ok(snapshot);
    }
    let migrated_state = migrators.migrate(snapshot.state, snapshot.schema_version, target_schema_version)?;
    Ok(Snapshot { schema_version: target_schema_version, state: migrated_state, ..snapshot })
}

#[cfg(test)]
#[path = "hot_swap_tests.rs"]
mod tests;
