// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The device lifecycle FSM.
//!
//! ```text
//! Detached  --Attach-->  Attaching --ok-->  Stopped
//! Stopped   --Start-->   Starting  --ok-->  Running
//! Running   --Stop-->    Stopping  --ok-->  Stopped
//! any non-terminal --Fail-->        Failed
//! Failed    --Reset-->              Stopped
//! Stopped|Failed --Detach--> Detaching --ok--> Detached (terminal)
//! ```

use crate::error::SerializableDeviceFailure;
use serde::{Deserialize, Serialize};

/// A state in the device lifecycle FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Detached,
    Attaching,
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
    Detaching,
}

crate::simple_display! {
    LifecycleState {
        Detached => "detached",
        Attaching => "attaching",
        Stopped => "stopped",
        Starting => "starting",
        Running => "running",
        Stopping => "stopping",
        Failed => "failed",
        Detaching => "detaching",
    }
}

impl LifecycleState {
    /// Transient states kick off a lifecycle plan plus the component's own
    /// hook on entry; completion is signalled by an internal event.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Attaching | Self::Starting | Self::Stopping | Self::Detaching)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Detached)
    }
}

/// Events that drive lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeviceLifecycleEvent {
    Attach,
    Start,
    Stop,
    Reset,
    Detach,
    Fail { failure: SerializableDeviceFailure },
    /// Internal: a transient state's plan/hook completed successfully.
    TransitionOk,
}

/// Error raised when an event does not apply to the current state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot apply {event:?} to device in state {state}")]
pub struct IllegalTransition {
    pub state: LifecycleState,
    pub event: DeviceLifecycleEvent,
}

impl LifecycleState {
    /// Compute the next state for an event, per the FSM graph above.
    ///
    /// Returns `Err` for any edge not drawn in the graph: no transition
    /// outside that graph is ever observed.
    pub fn apply(self, event: &DeviceLifecycleEvent) -> Result<LifecycleState, IllegalTransition> {
        use DeviceLifecycleEvent as E;
        use LifecycleState as S;

        let illegal = || IllegalTransition { state: self, event: event.clone() };

        if let E::Fail { .. } = event {
            return if self.is_transient() || matches!(self, S::Running) {
                Ok(S::Failed)
            } else {
                Err(illegal())
            };
        }

        match (self, event) {
            (S::Detached, E::Attach) => Ok(S::Attaching),
            (S::Attaching, E::TransitionOk) => Ok(S::Stopped),
            (S::Stopped, E::Start) => Ok(S::Starting),
            (S::Starting, E::TransitionOk) => Ok(S::Running),
            (S::Running, E::Stop) => Ok(S::Stopping),
            (S::Stopping, E::TransitionOk) => Ok(S::Stopped),
            (S::Failed, E::Reset) => Ok(S::Stopped),
            (S::Stopped, E::Detach) | (S::Failed, E::Detach) => Ok(S::Detaching),
            (S::Detaching, E::TransitionOk) => Ok(S::Detached),
            _ => Err(illegal()),
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_state_tests.rs"]
mod tests;
