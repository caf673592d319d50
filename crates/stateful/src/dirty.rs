// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dirty-version CAS tracking: `markDirty` and
//! `clearDirtyFlag` are a single packed `AtomicU64` (version in the high
//! bits, dirty flag in bit 0) so the CAS clear is genuinely lock-free and
//! race-proof against a concurrent `markDirty`, per §5 "Uses atomic
//! increment and atomic CAS clear; no general lock required for writes."

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

const DIRTY_BIT: u64 = 1;

fn pack(version: u64, dirty: bool) -> u64 {
    (version << 1) | (dirty as u64)
}

fn unpack(state: u64) -> (u64, bool) {
    (state >> 1, state & DIRTY_BIT != 0)
}

/// Per-device dirty-version counter plus `isDirty` flag, observable via
/// `watch` channels.
pub struct DirtyTracker {
    state: AtomicU64,
    version_tx: watch::Sender<u64>,
    dirty_tx: watch::Sender<bool>,
}

impl Default for DirtyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DirtyTracker {
    pub fn new() -> Self {
        let (version_tx, _) = watch::channel(0);
        let (dirty_tx, _) = watch::channel(false);
        Self { state: AtomicU64::new(pack(0, false)), version_tx, dirty_tx }
    }

    /// Current `dirtyVersion`.
    pub fn dirty_version(&self) -> u64 {
        unpack(self.state.load(Ordering::SeqCst)).0
    }

    pub fn is_dirty(&self) -> bool {
        unpack(self.state.load(Ordering::SeqCst)).1
    }

    pub fn subscribe_version(&self) -> watch::Receiver<u64> {
        self.version_tx.subscribe()
    }

    pub fn subscribe_dirty(&self) -> watch::Receiver<bool> {
        self.dirty_tx.subscribe()
    }

    /// Increments `dirtyVersion` by exactly 1 and sets `isDirty`.
    /// `dirtyVersion` never decreases; each call bumps it by exactly 1.
    pub fn mark_dirty(&self) -> u64 {
        loop {
            let old = self.state.load(Ordering::SeqCst);
            let (old_version, _) = unpack(old);
            let new_version = old_version + 1;
            let new = pack(new_version, true);
            if self.state.compare_exchange_weak(old, new, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
                let _ = self.version_tx.send(new_version);
                let _ = self.dirty_tx.send(true);
                return new_version;
            }
        }
    }

    /// CAS: clears `isDirty` only if `dirtyVersion` is still `expected`.
    /// Returns whether it cleared. A concurrent
    /// `mark_dirty()` between the caller's `snapshot()` and this call makes
    /// the CAS fail, leaving `isDirty = true` and the bumped version intact.
    pub fn clear_dirty_flag(&self, expected: u64) -> bool {
        let expected_state = pack(expected, true);
        let cleared_state = pack(expected, false);
        match self.state.compare_exchange(expected_state, cleared_state, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => {
                let _ = self.dirty_tx.send(false);
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "dirty_tests.rs"]
mod tests;
