// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action result caching: a deterministic cache key from
//! `(addr, actionName, canonicalized(input), scope-salt)`, TTL expiry, and
//! invalidation by topic match against each entry's `invalidationEvents`.
//!
//! Open question resolved in DESIGN.md: invalidation is global regardless
//! of `CacheScope`.

use crate::topic;
use dcc_core::{Address, CachePolicy, CacheScope, ExecutionResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;

struct Entry {
    result: ExecutionResult,
    inserted_at: Instant,
    ttl: std::time::Duration,
    invalidation_events: Vec<String>,
}

/// Per-hub store of cached `ExecutionResult::Immediate` outcomes, keyed by
/// a string computed from the action's cache-relevant inputs.
///
/// `Global` scope is documented as requiring "an external shared store...
/// the core treats it as pluggable"; this in-process cache
/// is that pluggable backend for the single-hub case, same as `PerHub`.
#[derive(Default)]
pub struct ActionCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl ActionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic cache key from the address, action name, canonicalized
    /// input, and a scope-dependent salt (principal id for `PerPrincipal`).
    pub fn key(addr: &Address, action_name: &str, input: &serde_json::Value, policy: &CachePolicy, principal: Option<&str>) -> String {
        let canonical_input = canonicalize(input);
        let salt = match policy.scope {
            CacheScope::PerPrincipal => principal.unwrap_or(""),
            CacheScope::PerHub | CacheScope::Global => "",
        };
        format!("{}\u{1}{action_name}\u{1}{canonical_input}\u{1}{salt}", addr)
    }

    pub fn get(&self, key: &str) -> Option<ExecutionResult> {
        let entries = self.entries.lock();
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() > entry.ttl {
            return None;
        }
        Some(entry.result.clone())
    }

    pub fn put(&self, key: String, result: ExecutionResult, policy: &CachePolicy) {
        self.entries.lock().insert(
            key,
            Entry { result, inserted_at: Instant::now(), ttl: policy.ttl, invalidation_events: policy.invalidation_events.clone() },
        );
    }

    /// Drop every entry whose `invalidationEvents` matches `event_topic`
    ///.
    pub fn invalidate(&self, event_topic: &str) {
        self.entries.lock().retain(|_, entry| !entry.invalidation_events.iter().any(|pattern| topic::matches(pattern, event_topic)));
    }
}

/// Deterministic string form of a JSON value: object keys sorted, so two
/// structurally-equal-but-differently-ordered inputs hash to the same key.
fn canonicalize(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys.iter().map(|k| format!("{k:?}:{}", canonicalize(&map[*k]))).collect();
            format!("{{{}}}", parts.join(","))
        }
        serde_json::Value::Array(items) => {
            format!("[{}]", items.iter().map(canonicalize).collect::<Vec<_>>().join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
