// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A running device instance: owns the lifecycle FSM, a
//! cancellation root for every task it spawns, and a bounded breadcrumb
//! trail of recent transitions for postmortem diagnosis.
//!
//! Built as a state-machine-over-events loop, the same shape as the rest
//! of the runtime's event handlers.

use dcc_core::{
    Breadcrumb, BreadcrumbTrail, Clock, DeviceLifecycleEvent, DynClock, IllegalTransition, LifecycleState,
    DEFAULT_BREADCRUMB_CAPACITY,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Circuit breaker threshold for re-entering the same transient state
/// (e.g. a device bouncing `Attaching -> Failed -> Reset -> Attaching`
/// forever because its `onAttach` plan always fails). Past this many
/// re-entries into the same transient state, the device is failed into a
/// terminal `Failed` with `CircuitBreakerTripped` rather than looping.
pub const MAX_TRANSIENT_VISITS: u32 = 5;

dcc_core::define_id! {
    /// Identifies one running instance of a blueprint (distinct from the
    /// blueprint it was instantiated from).
    pub struct DeviceInstanceId("dvi-");
}

/// A live device: lifecycle state, a cancellation root all of its spawned
/// tasks derive from, and a breadcrumb trail. Cheap to clone (an `Arc`
/// handle), so callers can hand it to supervisor tasks without
/// synchronizing on a registry.
#[derive(Clone)]
pub struct DeviceInstance {
    inner: Arc<Inner>,
}

struct Inner {
    id: DeviceInstanceId,
    blueprint_id: dcc_core::BlueprintId,
    state: Mutex<LifecycleState>,
    state_tx: watch::Sender<LifecycleState>,
    breadcrumbs: Mutex<BreadcrumbTrail>,
    cancellation: CancellationToken,
    clock: DynClock,
    transient_visits: Mutex<HashMap<LifecycleState, u32>>,
}

impl DeviceInstance {
    pub fn new(blueprint_id: dcc_core::BlueprintId, clock: DynClock) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Detached);
        Self {
            inner: Arc::new(Inner {
                id: DeviceInstanceId::new(),
                blueprint_id,
                state: Mutex::new(LifecycleState::Detached),
                state_tx,
                breadcrumbs: Mutex::new(BreadcrumbTrail::with_capacity(DEFAULT_BREADCRUMB_CAPACITY)),
                cancellation: CancellationToken::new(),
                clock,
                transient_visits: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn id(&self) -> &DeviceInstanceId {
        &self.inner.id
    }

    pub fn blueprint_id(&self) -> &dcc_core::BlueprintId {
        &self.inner.blueprint_id
    }

    pub fn current_state(&self) -> LifecycleState {
        *self.inner.state.lock()
    }

    /// Observe lifecycle transitions as they happen.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.inner.state_tx.subscribe()
    }

    /// Every spawned task for this device derives a child token from this
    /// one, so detaching the device cancels its whole task tree.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancellation.clone()
    }

    /// Drive the FSM with an event. Holds the state lock only for the
    /// duration of the pure transition + breadcrumb push; never across an
    /// `.await`.
    pub fn apply(&self, event: DeviceLifecycleEvent) -> Result<LifecycleState, IllegalTransition> {
        let mut state = self.inner.state.lock();
        let from = *state;
        let to = from.apply(&event)?;
        *state = to;
        let at_epoch_ms = self.inner.clock.epoch_ms();
        self.inner.breadcrumbs.lock().push(Breadcrumb { from, to, event, at_epoch_ms });
        drop(state);
        // watch::Sender::send never suspends; fine to call after releasing the lock.
        let _ = self.inner.state_tx.send(to);
        if to.is_terminal() {
            self.inner.cancellation.cancel();
        }
        tracing::debug!(device_id = %self.inner.id, %from, %to, "lifecycle transition");
        Ok(to)
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.inner.breadcrumbs.lock().iter().cloned().collect()
    }

    /// Record one more entry into `state` (a transient lifecycle state the
    /// caller is about to enter) and report whether the circuit breaker
    /// still allows it. Call before running the state's lifecycle plan;
    /// once visits exceed [`MAX_TRANSIENT_VISITS`] the caller should fail
    /// the device permanently instead of retrying the plan again.
    pub fn record_transient_entry(&self, state: LifecycleState) -> bool {
        let mut visits = self.inner.transient_visits.lock();
        let count = visits.entry(state).or_insert(0);
        *count += 1;
        *count <= MAX_TRANSIENT_VISITS
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
