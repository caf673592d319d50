// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named timer events: a device can request a named
//! periodic timer and receives `TimerTickEvent(name, dt)` where `dt` is
//! the actual elapsed interval, not the nominal one, so callers can assert
//! on reported `dt` rather than wall-clock skew — essential for
//! deterministic simulation.

use dcc_core::DynClock;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub struct TimerTickEvent {
    pub name: String,
    pub dt: Duration,
}

/// Spawns a periodic timer task bound to `cancellation`; the task exits
/// as soon as the token is cancelled or the receiver is dropped.
pub fn request_timer(name: impl Into<String>, interval: Duration, clock: DynClock, cancellation: CancellationToken) -> mpsc::Receiver<TimerTickEvent> {
    let (tx, rx) = mpsc::channel(8);
    let name = name.into();

    tokio::spawn(async move {
        let mut last = clock.now();
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => break,
                _ = tokio::time::sleep(interval) => {
                    let now = clock.now();
                    let dt = now.saturating_duration_since(last);
                    last = now;
                    if tx.send(TimerTickEvent { name: name.clone(), dt }).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    rx
}

#[cfg(test)]
#[path = "timers_tests.rs"]
mod tests;
