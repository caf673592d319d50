// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives one device's lifecycle FSM end to end: runs the
//! blueprint's `lifecyclePlans` through the Transaction Coordinator on
//! every transient entry, cascades attach/start/stop to `LINKED` children,
//! applies `ChildDeviceErrorHandler` on child failure, and schedules
//! restart-policy backoff on entering `Failed`.
//!
//! Built as a dispatch-by-state loop over the lifecycle FSM's transient
//! states, with child supervision layered on top.

use crate::instance::DeviceInstance;
use crate::restart::RestartSupervisor;
use dcc_core::{
    ChildComponentConfig, ChildDeviceErrorHandler, DeviceBlueprint, DeviceLifecycleEvent, ExecutionContext, Feature,
    FailureKind, IllegalTransition, LifecycleMode, LifecycleState, SerializableDeviceFailure,
};
use dcc_transaction::{ActionSink, Coordinator};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
}

/// Owns one running device's FSM plus its `LINKED` children.
///
/// `S` is the [`ActionSink`] the coordinator dispatches lifecycle-plan
/// leaves through — normally the hub shared by every device in the
/// process, since a lifecycle plan can reference any address, not just
/// this device's own.
pub struct DeviceSupervisor<S: ActionSink + 'static> {
    instance: DeviceInstance,
    blueprint: DeviceBlueprint,
    coordinator: Arc<Coordinator<S>>,
    restart: Option<RestartSupervisor>,
    children: RwLock<IndexMap<String, Arc<DeviceSupervisor<S>>>>,
}

fn restart_policy_of(blueprint: &DeviceBlueprint) -> Option<dcc_core::RestartPolicy> {
    blueprint.features.values().find_map(|f| match f {
        Feature::Lifecycle { restart_policy } => restart_policy.clone(),
        _ => None,
    })
}

impl<S: ActionSink + 'static> DeviceSupervisor<S> {
    pub fn new(instance: DeviceInstance, blueprint: DeviceBlueprint, coordinator: Arc<Coordinator<S>>) -> Self {
        let restart = restart_policy_of(&blueprint).map(RestartSupervisor::new);
        Self { instance, blueprint, coordinator, restart, children: RwLock::new(IndexMap::new()) }
    }

    pub fn instance(&self) -> &DeviceInstance {
        &self.instance
    }

    pub fn blueprint(&self) -> &DeviceBlueprint {
        &self.blueprint
    }

    /// Registers a local child supervisor under its configured local name.
    /// Cascade order follows blueprint declaration order (`children` is an
    /// order-preserving `IndexMap`).
    pub fn add_child(&self, local_name: impl Into<String>, child: Arc<DeviceSupervisor<S>>) {
        self.children.write().insert(local_name.into(), child);
    }

    pub fn child(&self, local_name: &str) -> Option<Arc<DeviceSupervisor<S>>> {
        self.children.read().get(local_name).cloned()
    }

    /// Every currently-registered child, in declaration order. Used by hot
    /// swap to carry a device's children over to its
    /// replacement supervisor.
    pub fn children_snapshot(&self) -> Vec<(String, Arc<DeviceSupervisor<S>>)> {
        self.children.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Drive the FSM with one external event, running lifecycle plans,
    /// cascading to `LINKED` children, and routing failures through the
    /// restart-policy / circuit-breaker machinery. Returns the state the
    /// device settled into — a stable state on success, or `Failed`.
    pub async fn handle_event(&self, event: DeviceLifecycleEvent, ctx: &ExecutionContext) -> Result<LifecycleState, SupervisorError> {
        let to = self.instance.apply(event)?;
        if !to.is_transient() {
            return Ok(to);
        }

        if !self.instance.record_transient_entry(to) {
            let failure = SerializableDeviceFailure::new(
                FailureKind::CircuitBreakerTripped,
                format!("exceeded re-entry limit for lifecycle state {to}"),
            );
            return Ok(self.instance.apply(DeviceLifecycleEvent::Fail { failure })?);
        }

        Ok(self.run_transient(to, ctx).await?)
    }

    async fn run_transient(&self, state: LifecycleState, ctx: &ExecutionContext) -> Result<LifecycleState, SupervisorError> {
        if matches!(state, LifecycleState::Starting) {
            if let Err(failure) = self.cascade_linked_children_up(ctx).await {
                return Ok(self.instance.apply(DeviceLifecycleEvent::Fail { failure })?);
            }
        }
        if matches!(state, LifecycleState::Stopping) {
            if let Err(failure) = self.cascade_linked_children_down(ctx).await {
                return Ok(self.instance.apply(DeviceLifecycleEvent::Fail { failure })?);
            }
        }

        let plan = match state {
            LifecycleState::Attaching => self.blueprint.lifecycle_plans.on_attach.as_ref(),
            LifecycleState::Starting => self.blueprint.lifecycle_plans.on_start.as_ref(),
            LifecycleState::Stopping => self.blueprint.lifecycle_plans.on_stop.as_ref(),
            LifecycleState::Detaching => self.blueprint.lifecycle_plans.on_detach.as_ref(),
            _ => None,
        };

        if let Some(plan) = plan {
            let report = self.coordinator.execute(plan, ctx.clone()).await;
            if !report.is_success() {
                let failure = report
                    .error
                    .map(SerializableDeviceFailure::from)
                    .unwrap_or_else(|| SerializableDeviceFailure::new(FailureKind::Other, "lifecycle plan failed"));
                return Ok(self.instance.apply(DeviceLifecycleEvent::Fail { failure })?);
            }
        }

        let next = self.instance.apply(DeviceLifecycleEvent::TransitionOk)?;
        if matches!(next, LifecycleState::Running) {
            if let Some(restart) = &self.restart {
                restart.on_successful_dwell();
            }
        }
        Ok(next)
    }

    /// Attach + start every `LINKED` local child, in declaration order,
    /// before the parent itself reaches `Running`.
    async fn cascade_linked_children_up(&self, ctx: &ExecutionContext) -> Result<(), SerializableDeviceFailure> {
        let children: Vec<_> = self.children.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        for (name, child) in children {
            let Some(mode) = self.child_error_policy(&name) else { continue };
            if mode.0 != LifecycleMode::Linked {
                continue;
            }
            if child.instance.current_state() == LifecycleState::Detached {
                let attached = child.handle_event(DeviceLifecycleEvent::Attach, ctx).await.map_err(supervisor_failure)?;
                if attached == LifecycleState::Failed {
                    self.handle_child_failure(&name, &child, mode.1, ctx).await?;
                    continue;
                }
            }
            if child.instance.current_state() == LifecycleState::Stopped {
                let result = child.handle_event(DeviceLifecycleEvent::Start, ctx).await.map_err(supervisor_failure)?;
                if result == LifecycleState::Failed {
                    self.handle_child_failure(&name, &child, mode.1, ctx).await?;
                }
            }
        }
        Ok(())
    }

    /// Stop every `LINKED` local child, in reverse declaration order,
    /// before the parent itself reaches `Stopped`.
    async fn cascade_linked_children_down(&self, ctx: &ExecutionContext) -> Result<(), SerializableDeviceFailure> {
        let children: Vec<_> = self.children.read().iter().rev().map(|(k, v)| (k.clone(), v.clone())).collect();
        for (name, child) in children {
            let Some(mode) = self.child_error_policy(&name) else { continue };
            if mode.0 != LifecycleMode::Linked {
                continue;
            }
            if child.instance.current_state() == LifecycleState::Running {
                child.handle_event(DeviceLifecycleEvent::Stop, ctx).await.map_err(supervisor_failure)?;
            }
        }
        Ok(())
    }

    fn child_error_policy(&self, local_name: &str) -> Option<(LifecycleMode, ChildDeviceErrorHandler)> {
        match self.blueprint.children.get(local_name)? {
            ChildComponentConfig::Local { lifecycle_config, .. } => Some((lifecycle_config.mode, lifecycle_config.error_handler)),
            ChildComponentConfig::Remote { .. } => None,
        }
    }

    /// Apply `ChildDeviceErrorHandler` once a `LINKED` child has gone
    /// `Failed` during cascade.
    async fn handle_child_failure(
        &self,
        name: &str,
        child: &Arc<DeviceSupervisor<S>>,
        handler: ChildDeviceErrorHandler,
        ctx: &ExecutionContext,
    ) -> Result<(), SerializableDeviceFailure> {
        match handler {
            ChildDeviceErrorHandler::Ignore => Ok(()),
            ChildDeviceErrorHandler::Restart => {
                let _ = child.handle_event(DeviceLifecycleEvent::Reset, ctx).await;
                let _ = child.handle_event(DeviceLifecycleEvent::Start, ctx).await;
                Ok(())
            }
            ChildDeviceErrorHandler::StopParent => {
                Err(SerializableDeviceFailure::new(FailureKind::Other, format!("linked child '{name}' failed; stopping parent")))
            }
            ChildDeviceErrorHandler::Propagate => {
                Err(SerializableDeviceFailure::new(FailureKind::Other, format!("linked child '{name}' failed")).caused_by(
                    SerializableDeviceFailure::new(FailureKind::Other, format!("child '{name}' lifecycle failure propagated")),
                ))
            }
        }
    }
}

fn supervisor_failure(err: SupervisorError) -> SerializableDeviceFailure {
    match err {
        SupervisorError::IllegalTransition(t) => SerializableDeviceFailure::new(FailureKind::Other, t.to_string()),
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
