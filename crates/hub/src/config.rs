// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process bootstrap configuration: where to listen, which blueprint files
//! to seed the registry from, and peer-hub addresses to dial on startup.
//! Deserialized with `toml`, the same declarative-struct convention used
//! throughout this workspace — distinct from blueprint-authoring format,
//! which is deliberately left unspecified; this is the ambient process
//! config, not a blueprint DSL.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    pub listen: ListenConfig,
    #[serde(default)]
    pub blueprint_seeds: Vec<String>,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeerConfig {
    pub name: String,
    pub driver_id: String,
    pub address: String,
}

impl HubConfig {
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
