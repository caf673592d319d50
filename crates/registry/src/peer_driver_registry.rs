// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The peer-driver registry: resolves a blueprint's
//! `PeerBlueprint::driver_id` to a live `PeerDriver` implementation
//! (`dcc-hub`'s connection/transport layer is pluggable; this crate only
//! owns the tag dispatch table).

use crate::tag_registry::{TagRegistry, TagRegistryBuilder};

/// Marker trait driver implementations in `dcc-hub` satisfy; kept in
/// `dcc-registry` only as an object-safe dispatch target so the registry
/// doesn't need to depend on `dcc-hub` (which depends on `dcc-registry`).
pub trait PeerDriverHandle: Send + Sync {
    fn driver_id(&self) -> &str;
}

pub type PeerDriverRegistry = TagRegistry<dyn PeerDriverHandle>;
pub type PeerDriverRegistryBuilder = TagRegistryBuilder<dyn PeerDriverHandle>;

#[cfg(test)]
#[path = "peer_driver_registry_tests.rs"]
mod tests;
