// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The versioned snapshot format: `{ version,
//! schemaVersion, state, blobs? }`, with `version` the dirty-version at
//! capture time and `schemaVersion` the blueprint's schema version at
//! write time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A point-in-time capture of a device's persistent properties.
///
/// Invariants: `version` is monotonically non-decreasing per
/// device; `schema_version` matches the owning blueprint's at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub schema_version: u32,
    pub state: serde_json::Value,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub blobs: HashMap<String, Vec<u8>>,
}

impl Snapshot {
    pub fn new(version: u64, schema_version: u32, state: serde_json::Value) -> Self {
        Self { version, schema_version, state, blobs: HashMap::new() }
    }

    pub fn with_blobs(mut self, blobs: HashMap<String, Vec<u8>>) -> Self {
        self.blobs = blobs;
        self
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
