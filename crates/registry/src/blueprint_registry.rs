// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The blueprint registry: `register`/`resolve` plus
//! inheritance flattening with duplicate/cycle detection.
//!
//! Built as a frozen, thread-safe, read-mostly map: construct once via the
//! builder, then serve lookups without further locking.
//!
//! A blueprint id may carry several registered versions. `resolve` takes an optional version:
//! exact match when given, otherwise the newest semver-comparable version
//! registered under that id. `inheritsFrom` is a bare `BlueprintId` with no
//! version attached; this registry resolves a parent edge
//! against that parent's newest registered version, documented as the
//! reading of an otherwise-silent spec point (see DESIGN.md).
use crate::error::RegistryError;
use dcc_core::{BlueprintId, DeviceBlueprint};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Frozen, thread-safe map of registered blueprints, keyed by
/// [`BlueprintId`] then by version string.
///
/// Registration happens during bootstrap via [`BlueprintRegistryBuilder`];
/// once built the registry is read-only for the rest of the process
/// lifetime, so lookups never take a lock.
#[derive(Debug, Clone)]
pub struct BlueprintRegistry {
    blueprints: Arc<HashMap<BlueprintId, IndexMap<String, DeviceBlueprint>>>,
}

#[derive(Debug, Default)]
pub struct BlueprintRegistryBuilder {
    blueprints: HashMap<BlueprintId, IndexMap<String, DeviceBlueprint>>,
}

impl BlueprintRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, blueprint: DeviceBlueprint) -> Result<&mut Self, RegistryError> {
        let versions = self.blueprints.entry(blueprint.id.clone()).or_default();
        if versions.contains_key(&blueprint.version) {
            return Err(RegistryError::DuplicateBlueprint(blueprint.id));
        }
        tracing::debug!(blueprint_id = %blueprint.id, version = %blueprint.version, "registering blueprint");
        versions.insert(blueprint.version.clone(), blueprint);
        Ok(self)
    }

    /// Validate every `inherits_from` edge resolves and contains no cycles,
    /// then freeze the registry.
    pub fn build(self) -> Result<BlueprintRegistry, RegistryError> {
        for versions in self.blueprints.values() {
            for blueprint in versions.values() {
                if let Some(parent) = &blueprint.inherits_from {
                    if !self.blueprints.contains_key(parent) {
                        return Err(RegistryError::UnknownParent(blueprint.id.clone(), parent.clone()));
                    }
                }
            }
        }
        for id in self.blueprints.keys() {
            detect_cycle(&self.blueprints, id)?;
        }
        Ok(BlueprintRegistry { blueprints: Arc::new(self.blueprints) })
    }
}

/// Cycle detection walks the `id` graph (ignoring version, since
/// `inheritsFrom` names no version): each id's representative parent is
/// the parent id named by any of its registered versions.
fn detect_cycle(blueprints: &HashMap<BlueprintId, IndexMap<String, DeviceBlueprint>>, start: &BlueprintId) -> Result<(), RegistryError> {
    let mut chain = vec![start.clone()];
    let mut current = start.clone();
    loop {
        // Allow expect here as every id in `chain` was either the caller's
        // own key into `blueprints` or a parent resolved by the unknown-parent
        // check above, which runs before cycle detection and rejects any
        // `inheritsFrom` naming an id absent from `blueprints`.
        #[allow(clippy::expect_used)]
        let versions = blueprints.get(&current).expect("validated to exist by build()");
        let Some(parent) = versions.values().find_map(|b| b.inherits_from.clone()) else { return Ok(()) };
        if chain.contains(&parent) {
            chain.push(parent);
            return Err(RegistryError::InheritanceCycle(chain));
        }
        chain.push(parent.clone());
        current = parent;
    }
}

/// Best-effort numeric comparison of `major.minor.patch`-shaped version
/// strings; non-numeric or short components fall back to `0` rather than
/// failing, so an oddly-shaped version string still orders deterministically
/// instead of panicking.
fn semver_key(version: &str) -> (u64, u64, u64) {
    let mut parts = version.split('.').map(|p| p.parse::<u64>().unwrap_or(0));
    (parts.next().unwrap_or(0), parts.next().unwrap_or(0), parts.next().unwrap_or(0))
}

impl BlueprintRegistry {
    /// Resolve a blueprint id (optionally pinned to an exact version) to
    /// its fully inheritance-merged view: walks the `inherits_from` chain
    /// from the root down, merging property, action, stream, alarm, child,
    /// and peer-connection lists by name while preserving declaration
    /// order — a child entry overrides a parent entry with
    /// the same name, new entries are appended in the order first declared.
    pub fn resolve(&self, id: &BlueprintId, version: Option<&str>) -> Result<DeviceBlueprint, RegistryError> {
        let leaf = self.lookup(id, version)?;

        let mut chain = vec![leaf];
        let mut current = leaf;
        while let Some(parent_id) = &current.inherits_from {
            let parent = self.lookup(parent_id, None)?;
            chain.push(parent);
            current = parent;
        }
        chain.reverse(); // root-first

        let mut merged = chain[0].clone();
        for child in &chain[1..] {
            merge_blueprint(&mut merged, child);
        }
        merged.id = leaf.id.clone();
        merged.inherits_from = leaf.inherits_from.clone();
        Ok(merged)
    }

    fn lookup(&self, id: &BlueprintId, version: Option<&str>) -> Result<&DeviceBlueprint, RegistryError> {
        let versions = self.blueprints.get(id).ok_or_else(|| RegistryError::UnknownBlueprint(id.clone()))?;
        match version {
            Some(v) => versions.get(v).ok_or_else(|| RegistryError::UnknownBlueprint(id.clone())),
            None => versions.values().max_by_key(|b| semver_key(&b.version)).ok_or_else(|| RegistryError::UnknownBlueprint(id.clone())),
        }
    }

    pub fn contains(&self, id: &BlueprintId) -> bool {
        self.blueprints.contains_key(id)
    }

    pub fn contains_version(&self, id: &BlueprintId, version: &str) -> bool {
        self.blueprints.get(id).is_some_and(|versions| versions.contains_key(version))
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

fn merge_blueprint(base: &mut DeviceBlueprint, overlay: &DeviceBlueprint) {
    base.version = overlay.version.clone();
    base.schema_version = overlay.schema_version;
    for (name, feature) in &overlay.features {
        base.features.insert(name.clone(), feature.clone());
    }
    for (name, property) in &overlay.properties {
        base.properties.insert(name.clone(), property.clone());
    }
    for (name, action) in &overlay.actions {
        base.actions.insert(name.clone(), action.clone());
    }
    for (name, stream) in &overlay.streams {
        base.streams.insert(name.clone(), stream.clone());
    }
    for (name, alarm) in &overlay.alarms {
        base.alarms.insert(name.clone(), alarm.clone());
    }
    for (name, child) in &overlay.children {
        base.children.insert(name.clone(), child.clone());
    }
    for (name, peer) in &overlay.peer_connections {
        base.peer_connections.insert(name.clone(), peer.clone());
    }
    if overlay.lifecycle_plans.on_attach.is_some() {
        base.lifecycle_plans.on_attach = overlay.lifecycle_plans.on_attach.clone();
    }
    if overlay.lifecycle_plans.on_start.is_some() {
        base.lifecycle_plans.on_start = overlay.lifecycle_plans.on_start.clone();
    }
    if overlay.lifecycle_plans.on_stop.is_some() {
        base.lifecycle_plans.on_stop = overlay.lifecycle_plans.on_stop.clone();
    }
    if overlay.lifecycle_plans.on_detach.is_some() {
        base.lifecycle_plans.on_detach = overlay.lifecycle_plans.on_detach.clone();
    }
}

#[cfg(test)]
#[path = "blueprint_registry_tests.rs"]
mod tests;
