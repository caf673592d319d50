// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart-policy bookkeeping: tracks the attempt counter
//! for a device sitting in `Failed`, computes the backoff delay for the
//! next attempt from its `RestartStrategy`, and resets on a successful
//! `Running` dwell when `resetOnSuccess` is set.
//!
//! `maxAttempts <= 0` means unbounded, per `RestartPolicy::is_unbounded`
//! in `dcc-core` — the authoritative reading of §4.2's "maxAttempts ≤ 0 ⇒
//! unbounded" over §8's boundary-behavior line describing `maxAttempts =
//! 0` as "no restart attempted" (see DESIGN.md).

use dcc_core::RestartPolicy;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

pub struct RestartSupervisor {
    policy: RestartPolicy,
    attempts: AtomicU32,
}

impl RestartSupervisor {
    pub fn new(policy: RestartPolicy) -> Self {
        Self { policy, attempts: AtomicU32::new(0) }
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Consult the policy for the next restart attempt. Returns the delay
    /// to wait before restarting, or `None` once `maxAttempts` is
    /// exhausted — the device then remains `Failed` indefinitely.
    pub fn next_delay(&self) -> Option<Duration> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.policy.allows_attempt(attempt) {
            return None;
        }
        Some(self.policy.strategy.delay_for_attempt(attempt))
    }

    /// Called after a dwell in `Running` completes successfully. Resets
    /// the attempt counter back to 0 when the policy opts into it, so the
    /// next failure sequence starts its backoff fresh at attempt 1.
    pub fn on_successful_dwell(&self) {
        if self.policy.reset_on_success {
            self.attempts.store(0, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
#[path = "restart_tests.rs"]
mod tests;
