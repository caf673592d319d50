// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `DeviceHub`: the public surface clients call
//! (`readProperty`/`writeProperty`/`execute`/`subscribe`/`publish`) and
//! the [`ActionSink`] the Transaction Coordinator drives plan leaves
//! through. One hub owns every local device instance plus the broker,
//! action cache, and peer table; a device is addressed by its
//! hierarchical [`DeviceName`] within the hub and reached through
//! whichever [`DeviceEntry`] the address resolves to.
//!
//! Dispatches by message kind, the same way a local listener would, but
//! also forwards to remote peer hubs for addresses outside its own route.

use crate::action_handler::ActionHandler;
use crate::audit::{AuditLog, AuditRecord};
use crate::broker::MessageBroker;
use crate::cache::ActionCache;
use crate::error::HubError;
use crate::peer::{PeerConnection, Qos};
use crate::snapshot_store::SnapshotStore;
use crate::wire::Envelope;
use async_trait::async_trait;
use dcc_core::{
    Address, BlueprintId, ChildComponentConfig, CorrelationId, DeviceFault, DeviceLifecycleEvent, DeviceMessage, DeviceName,
    DynClock, ExecutionContext, ExecutionId, ExecutionResult, Feature, JobStatus, LifecycleState, SerializableDeviceFailure,
    ValidationRule,
};
use dcc_registry::{BlueprintRegistry, MigratorRegistry};
use dcc_runtime::{DeviceInstance, DeviceSupervisor};
use dcc_stateful::StatefulPropertyStore;
use dcc_transaction::{ActionSink, Coordinator, TransactionError};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// One locally-instantiated device: its FSM/supervisor, the property
/// values addressed through it, and whatever [`ActionHandler`] serves its
/// named actions.
struct DeviceEntry {
    supervisor: Arc<DeviceSupervisor<DeviceHub>>,
    /// Every declared property's current value, `persistent` ones tracked
    /// through the dirty-version CAS machinery, everything else a plain
    /// map.
    stateful: StatefulPropertyStore,
    transient_properties: RwLock<HashMap<String, Value>>,
    action_handler: RwLock<Option<Arc<dyn ActionHandler>>>,
}

impl DeviceEntry {
    fn read(&self, descriptor: &dcc_core::PropertyDescriptor) -> Option<Value> {
        if descriptor.persistent {
            self.stateful.read(&descriptor.name)
        } else {
            self.transient_properties.read().get(&descriptor.name).cloned()
        }
    }

    fn write(&self, descriptor: &dcc_core::PropertyDescriptor, value: Value) {
        if descriptor.persistent {
            self.stateful.write(&descriptor.name, value);
        } else {
            self.transient_properties.write().insert(descriptor.name.clone(), value);
        }
    }
}

/// The hub: owns every locally-attached device, the broker devices
/// publish through, the action-result cache, and the peer table used to
/// forward operations on non-local addresses.
pub struct DeviceHub {
    registry: Arc<BlueprintRegistry>,
    migrators: Arc<MigratorRegistry>,
    devices: RwLock<IndexMap<DeviceName, Arc<DeviceEntry>>>,
    broker: MessageBroker,
    cache: ActionCache,
    snapshot_store: Arc<dyn SnapshotStore>,
    audit: Arc<dyn AuditLog>,
    peers: RwLock<HashMap<String, Arc<dyn PeerConnection>>>,
    clock: DynClock,
    coordinator: OnceLock<Arc<Coordinator<DeviceHub>>>,
    /// Cancellation handle for every deferred job still running, removed
    /// once the job reaches a terminal `JobStatus`.
    executions: RwLock<HashMap<ExecutionId, CancellationToken>>,
}

impl DeviceHub {
    pub fn new(
        registry: Arc<BlueprintRegistry>,
        migrators: Arc<MigratorRegistry>,
        snapshot_store: Arc<dyn SnapshotStore>,
        audit: Arc<dyn AuditLog>,
        clock: DynClock,
    ) -> Arc<Self> {
        let hub = Arc::new(Self {
            registry,
            migrators,
            devices: RwLock::new(IndexMap::new()),
            broker: MessageBroker::new(),
            cache: ActionCache::new(),
            snapshot_store,
            audit,
            peers: RwLock::new(HashMap::new()),
            clock,
            coordinator: OnceLock::new(),
            executions: RwLock::new(HashMap::new()),
        });
        // `Coordinator::new` needs an `Arc<DeviceHub>` to hand to
        // `DeviceSupervisor`s as the sink they run lifecycle plans
        // against; the hub can only offer that `Arc` after it's already
        // constructed, so the coordinator is filled in as a second step
        // rather than inside `Arc::new` itself.
        let coordinator = Coordinator::new(hub.clone());
        hub.coordinator.set(Arc::new(coordinator)).unwrap_or_else(|_| unreachable!("set once, immediately after construction"));
        hub
    }

    // Allow expect here as `coordinator` is always populated synchronously
    // inside `DeviceHub::new` before the constructed `Arc<Self>` is handed
    // back to any caller, so every post-construction call observes it set.
    #[allow(clippy::expect_used)]
    fn coordinator(&self) -> &Arc<Coordinator<DeviceHub>> {
        self.coordinator.get().expect("coordinator initialized in DeviceHub::new")
    }

    pub fn connect_peer(&self, hub_id: impl Into<String>, connection: Arc<dyn PeerConnection>) {
        self.peers.write().insert(hub_id.into(), connection);
    }

    pub fn set_action_handler(&self, device: &DeviceName, handler: Arc<dyn ActionHandler>) -> Result<(), HubError> {
        let entry = self.lookup(device)?;
        *entry.action_handler.write() = Some(handler);
        Ok(())
    }

    pub fn device_state(&self, device: &DeviceName) -> Result<LifecycleState, HubError> {
        Ok(self.lookup(device)?.supervisor.instance().current_state())
    }

    pub fn contains(&self, device: &DeviceName) -> bool {
        self.devices.read().contains_key(device)
    }

    fn lookup(&self, device: &DeviceName) -> Result<Arc<DeviceEntry>, HubError> {
        self.devices.read().get(device).cloned().ok_or_else(|| HubError::UnknownDevice(device.to_string()))
    }

    // ---- Attach / lifecycle -------------------------------------------------

    #[instrument(skip(self, config, ctx))]
    pub async fn attach(
        &self,
        address: &Address,
        blueprint_id: &BlueprintId,
        version: Option<&str>,
        config: Value,
        ctx: &ExecutionContext,
    ) -> Result<LifecycleState, HubError> {
        if !address.is_local() {
            return Err(HubError::UnknownDevice(format!("cannot attach a device through a remote route: {address}")));
        }
        if self.devices.read().contains_key(&address.device) {
            return Err(HubError::Fault(DeviceFault::PreconditionFailed { message: format!("device '{}' already attached", address.device) }));
        }

        let blueprint = self.registry.resolve(blueprint_id, version).map_err(|e| HubError::Fault(DeviceFault::NotFound { what: e.to_string() }))?;
        let instance = DeviceInstance::new(blueprint.id.clone(), self.clock.clone());
        let is_stateful = blueprint.features.values().any(|f| matches!(f, Feature::Stateful { .. }));
        let entry = Arc::new(DeviceEntry {
            supervisor: Arc::new(DeviceSupervisor::new(instance, blueprint.clone(), self.coordinator().clone())),
            stateful: StatefulPropertyStore::new(blueprint.schema_version),
            transient_properties: RwLock::new(HashMap::new()),
            action_handler: RwLock::new(None),
        });

        if let Value::Object(fields) = &config {
            for (name, value) in fields {
                if let Some(descriptor) = blueprint.properties.get(name) {
                    entry.write(descriptor, value.clone());
                }
            }
        }

        // Restore a snapshot left over from a previous run, if this
        // device was ever persisted here before.
        if is_stateful {
            if let Some(snapshot) = self.snapshot_store.load(address.device.as_str()).await {
                entry.stateful.restore(snapshot, LifecycleState::Attaching, &self.migrators).ok();
            }
        }

        self.register_local_children(&blueprint, &address.device, &entry.supervisor)?;
        self.devices.write().insert(address.device.clone(), entry.clone());

        let state = entry.supervisor.handle_event(DeviceLifecycleEvent::Attach, ctx).await.map_err(|e| HubError::IllegalTransition(e.to_string()))?;
        self.emit_lifecycle_changed(&address.device, state).await;
        Ok(state)
    }

    /// Pre-registers (but doesn't attach) every `Local` child so they
    /// exist by the time `DeviceSupervisor::cascade_linked_children_up`
    /// looks them up on the parent's `Start`.
    fn register_local_children(
        &self,
        blueprint: &dcc_core::DeviceBlueprint,
        parent_name: &DeviceName,
        parent: &Arc<DeviceSupervisor<DeviceHub>>,
    ) -> Result<(), HubError> {
        for (local_name, child_config) in &blueprint.children {
            let ChildComponentConfig::Local { blueprint_id, version, .. } = child_config else { continue };
            let child_name = parent_name.child(local_name);
            if self.devices.read().contains_key(&child_name) {
                continue;
            }
            let child_blueprint = self
                .registry
                .resolve(blueprint_id, Some(version.as_str()))
                .map_err(|e| HubError::Fault(DeviceFault::NotFound { what: e.to_string() }))?;
            let child_instance = DeviceInstance::new(child_blueprint.id.clone(), self.clock.clone());
            let child_supervisor =
                Arc::new(DeviceSupervisor::new(child_instance, child_blueprint.clone(), self.coordinator().clone()));
            let child_entry = Arc::new(DeviceEntry {
                stateful: StatefulPropertyStore::new(child_blueprint.schema_version),
                transient_properties: RwLock::new(HashMap::new()),
                action_handler: RwLock::new(None),
                supervisor: child_supervisor.clone(),
            });
            self.register_local_children(&child_blueprint, &child_name, &child_supervisor)?;
            self.devices.write().insert(child_name, child_entry);
            parent.add_child(local_name.clone(), child_supervisor);
        }
        Ok(())
    }

    #[instrument(skip(self, ctx))]
    pub async fn start(&self, address: &Address, ctx: &ExecutionContext) -> Result<LifecycleState, HubError> {
        self.drive(address, DeviceLifecycleEvent::Start, ctx).await
    }

    #[instrument(skip(self, ctx))]
    pub async fn stop(&self, address: &Address, ctx: &ExecutionContext) -> Result<LifecycleState, HubError> {
        self.drive(address, DeviceLifecycleEvent::Stop, ctx).await
    }

    #[instrument(skip(self, ctx))]
    pub async fn reset(&self, address: &Address, ctx: &ExecutionContext) -> Result<LifecycleState, HubError> {
        self.drive(address, DeviceLifecycleEvent::Reset, ctx).await
    }

    #[instrument(skip(self, ctx))]
    pub async fn detach(&self, address: &Address, ctx: &ExecutionContext) -> Result<LifecycleState, HubError> {
        if !address.is_local() {
            return Err(HubError::UnknownDevice(address.to_string()));
        }
        let entry = self.lookup(&address.device)?;
        if is_stateful(&entry) {
            self.snapshot_store.save(address.device.as_str(), &entry.stateful.snapshot()).await;
        }
        let state = entry.supervisor.handle_event(DeviceLifecycleEvent::Detach, ctx).await.map_err(|e| HubError::IllegalTransition(e.to_string()))?;
        self.emit_lifecycle_changed(&address.device, state).await;
        if state == LifecycleState::Detached {
            self.devices.write().shift_remove(&address.device);
        }
        Ok(state)
    }

    async fn drive(&self, address: &Address, event: DeviceLifecycleEvent, ctx: &ExecutionContext) -> Result<LifecycleState, HubError> {
        if !address.is_local() {
            return Err(HubError::UnknownDevice(address.to_string()));
        }
        let entry = self.lookup(&address.device)?;
        let state = entry.supervisor.handle_event(event, ctx).await.map_err(|e| HubError::IllegalTransition(e.to_string()))?;
        self.emit_lifecycle_changed(&address.device, state).await;
        Ok(state)
    }

    /// Upgrades a running device to a new blueprint version without
    /// detaching it. Snapshots the old device's
    /// stateful properties, migrates that snapshot to the replacement
    /// blueprint's schema version, instantiates the replacement in
    /// `Attaching`, restores the migrated snapshot onto it, carries over
    /// its children and its slot in any parent's child table, then swaps
    /// the hub's device-table entry. The old device and its entry are left
    /// untouched if any step before the final swap fails.
    ///
    /// The replacement's `Attaching` state here is a scratch placeholder
    /// that makes `StatefulPropertyStore::restore` legal, not a real
    /// reattachment: the blueprint's `onAttach` plan does not run again,
    /// since hot swap replaces an already-attached device's implementation
    /// rather than attaching a new one from scratch.
    #[instrument(skip(self, ctx))]
    pub async fn hot_swap(
        &self,
        address: &Address,
        new_blueprint_id: &BlueprintId,
        new_version: Option<&str>,
        ctx: &ExecutionContext,
    ) -> Result<LifecycleState, HubError> {
        if !address.is_local() {
            return Err(HubError::UnknownDevice(address.to_string()));
        }
        let old_entry = self.lookup(&address.device)?;
        if !is_stateful(&old_entry) {
            return Err(HubError::Fault(DeviceFault::PreconditionFailed { message: "hot swap requires a stateful device".into() }));
        }

        let new_blueprint = self
            .registry
            .resolve(new_blueprint_id, new_version)
            .map_err(|e| HubError::Fault(DeviceFault::NotFound { what: e.to_string() }))?;
        let migrated = dcc_stateful::prepare_migrated_snapshot(&old_entry.stateful, new_blueprint.schema_version, &self.migrators)
            .map_err(HubError::Fault)?;

        let new_instance = DeviceInstance::new(new_blueprint.id.clone(), self.clock.clone());
        new_instance.apply(DeviceLifecycleEvent::Attach).map_err(|e| HubError::IllegalTransition(e.to_string()))?;
        let new_stateful = StatefulPropertyStore::new(new_blueprint.schema_version);
        new_stateful.restore(migrated, LifecycleState::Attaching, &self.migrators).map_err(HubError::Fault)?;
        let state = new_instance.apply(DeviceLifecycleEvent::TransitionOk).map_err(|e| HubError::IllegalTransition(e.to_string()))?;

        let new_supervisor = Arc::new(DeviceSupervisor::new(new_instance, new_blueprint.clone(), self.coordinator().clone()));
        for (name, child) in old_entry.supervisor.children_snapshot() {
            new_supervisor.add_child(name, child);
        }
        let new_entry = Arc::new(DeviceEntry {
            supervisor: new_supervisor.clone(),
            stateful: new_stateful,
            transient_properties: RwLock::new(old_entry.transient_properties.read().clone()),
            action_handler: RwLock::new(old_entry.action_handler.read().clone()),
        });

        self.devices.write().insert(address.device.clone(), new_entry);
        if let Some(parent_name) = address.device.parent() {
            if let Ok(parent_entry) = self.lookup(&parent_name) {
                parent_entry.supervisor.add_child(address.device.local_segment().to_string(), new_supervisor);
            }
        }
        self.emit_lifecycle_changed(&address.device, state).await;
        Ok(state)
    }

    async fn emit_lifecycle_changed(&self, device: &DeviceName, state: LifecycleState) {
        let topic = format!("hub.lifecycle.{device}");
        let payload = serde_json::json!({ "device": device.as_str(), "state": state.to_string() });
        self.publish(&topic, payload.clone(), Some(device.to_string()), HashMap::new());
        self.audit
            .record(AuditRecord {
                payload_type: "lifecycle.stateChanged".into(),
                time: epoch_iso(&self.clock),
                source_device: device.to_string(),
                target_device: None,
                request_id: None,
                correlation_id: None,
                payload,
            })
            .await;
    }

    // ---- Properties -----------------------------------------------------

    #[instrument(skip(self, ctx))]
    pub async fn read_property(&self, address: &Address, name: &str, ctx: &ExecutionContext) -> Result<Value, HubError> {
        if !address.is_local() {
            return self.peer_read(address, name, ctx).await;
        }
        let entry = self.lookup(&address.device)?;
        let descriptor = entry
            .supervisor
            .blueprint()
            .properties
            .get(name)
            .ok_or_else(|| HubError::Fault(DeviceFault::NotFound { what: format!("property '{name}'") }))?;
        if !descriptor.readable {
            return Err(HubError::Fault(DeviceFault::PreconditionFailed { message: format!("property '{name}' is not readable") }));
        }
        Ok(entry.read(descriptor).unwrap_or(Value::Null))
    }

    #[instrument(skip(self, value, ctx))]
    pub async fn write_property(&self, address: &Address, name: &str, value: Value, ctx: &ExecutionContext) -> Result<(), HubError> {
        if !address.is_local() {
            return self.peer_write(address, name, value, ctx).await;
        }
        let entry = self.lookup(&address.device)?;
        let descriptor = entry
            .supervisor
            .blueprint()
            .properties
            .get(name)
            .ok_or_else(|| HubError::Fault(DeviceFault::NotFound { what: format!("property '{name}'") }))?
            .clone();
        if !descriptor.mutable {
            return Err(HubError::Fault(DeviceFault::PreconditionFailed { message: format!("property '{name}' is not mutable") }));
        }
        validate(&descriptor.validation_rules, &value).map_err(HubError::Fault)?;
        entry.write(&descriptor, value.clone());

        let topic = format!("device.{}.changed", address.device);
        self.publish(&topic, serde_json::json!({ "property": name, "value": value }), Some(address.to_string()), HashMap::new());
        self.audit
            .record(AuditRecord {
                payload_type: "property.changed".into(),
                time: epoch_iso(&self.clock),
                source_device: address.device.to_string(),
                target_device: None,
                request_id: None,
                correlation_id: None,
                payload: serde_json::json!({ "property": name, "value": value }),
            })
            .await;
        Ok(())
    }

    // ---- Actions ----------------------------------------------------------

    #[instrument(skip(self, input, ctx))]
    pub async fn execute(&self, address: &Address, action_name: &str, input: Value, ctx: &ExecutionContext) -> Result<ExecutionResult, HubError> {
        if !address.is_local() {
            return self.peer_execute(address, action_name, input, ctx).await;
        }
        let entry = self.lookup(&address.device)?;
        let descriptor = entry
            .supervisor
            .blueprint()
            .actions
            .get(action_name)
            .ok_or_else(|| HubError::Fault(DeviceFault::NotFound { what: format!("action '{action_name}'") }))?
            .clone();

        if !descriptor.permissions.is_empty() && !descriptor.permissions.iter().all(|p| ctx.permissions.iter().any(|g| g == p)) {
            return Err(HubError::Fault(DeviceFault::AuthorizationDenied { action: action_name.to_string() }));
        }

        let cache_key = descriptor
            .cache_policy
            .as_ref()
            .map(|policy| (policy.clone(), ActionCache::key(address, action_name, &input, policy, ctx.principal.as_deref())));
        if let Some((_, key)) = &cache_key {
            if let Some(cached) = self.cache.get(key) {
                return Ok(cached);
            }
        }

        if let Some(topic) = descriptor.operational_event_types.as_ref().and_then(|t| t.on_dispatch.as_ref()) {
            self.publish(topic, serde_json::json!({ "action": action_name, "input": input }), None, HashMap::new());
        }

        if descriptor.deferred {
            return Ok(self.spawn_deferred(address.device.clone(), action_name.to_string(), input, ctx.clone(), descriptor, cache_key));
        }

        let outcome = self.coordinator().invoke_action_direct(address.device.as_str(), action_name, input, ctx).await;
        let status = terminal_status(outcome);
        self.fire_terminal_events(&descriptor, action_name, &status);
        let result = ExecutionResult::Immediate(status);

        if let Some((policy, key)) = cache_key {
            if matches!(result, ExecutionResult::Immediate(JobStatus::Succeeded { .. })) {
                self.cache.put(key, result.clone(), &policy);
            }
        }
        Ok(result)
    }

    /// Dispatches `action_name` on a detached task and hands back a
    /// `Deferred` handle whose `status` stream is pushed `Running` then
    /// exactly one terminal `JobStatus`. Racing the dispatch against the
    /// execution's `CancellationToken` (see [`DeviceHub::cancel_execution`])
    /// lets cancellation settle the stream to `Cancelled` without waiting
    /// for the underlying action handler to return.
    fn spawn_deferred(
        &self,
        device: DeviceName,
        action_name: String,
        input: Value,
        ctx: ExecutionContext,
        descriptor: dcc_core::ActionDescriptor,
        cache_key: Option<(dcc_core::CachePolicy, String)>,
    ) -> ExecutionResult {
        let execution_id = ExecutionId::new();
        let (tx, rx) = watch::channel(JobStatus::Pending);
        let cancel = CancellationToken::new();
        self.executions.write().insert(execution_id, cancel.clone());

        // `sink()` hands back the hub's own `Arc<Self>`, letting the spawned
        // task outlive this call without borrowing `&self`.
        let hub = self.coordinator().sink().clone();
        tokio::spawn(async move {
            let _ = tx.send(JobStatus::Running { progress: None });
            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => JobStatus::Cancelled,
                outcome = hub.coordinator().invoke_action_direct(device.as_str(), &action_name, input, &ctx) => terminal_status(outcome),
            };
            hub.fire_terminal_events(&descriptor, &action_name, &status);
            if let (Some((policy, key)), JobStatus::Succeeded { output }) = (&cache_key, &status) {
                hub.cache.put(key.clone(), ExecutionResult::Immediate(JobStatus::Succeeded { output: output.clone() }), policy);
            }
            hub.executions.write().remove(&execution_id);
            let _ = tx.send(status);
        });

        ExecutionResult::Deferred { execution_id, status: rx }
    }

    /// Cancels a deferred job in flight, settling its `status` stream to
    /// `Cancelled` exactly once. Returns `false` if `execution_id` is
    /// unknown or the job already reached a terminal status.
    pub fn cancel_execution(&self, execution_id: &ExecutionId) -> bool {
        match self.executions.read().get(execution_id) {
            Some(cancel) => {
                cancel.cancel();
                true
            }
            None => false,
        }
    }

    fn fire_terminal_events(&self, descriptor: &dcc_core::ActionDescriptor, action_name: &str, status: &JobStatus) {
        let events = match &descriptor.operational_event_types {
            Some(events) => events,
            None => return,
        };
        match status {
            JobStatus::Succeeded { output } => {
                if let Some(topic) = &events.on_success {
                    self.publish(topic, serde_json::json!({ "action": action_name, "output": output }), None, HashMap::new());
                }
            }
            JobStatus::Faulted { fault } => {
                if let Some(topic) = &events.on_failure {
                    self.publish(topic, serde_json::json!({ "action": action_name, "fault": fault.code() }), None, HashMap::new());
                }
            }
            JobStatus::Failed { failure } => {
                if let Some(topic) = &events.on_failure {
                    self.publish(topic, serde_json::json!({ "action": action_name, "failure": failure.to_string() }), None, HashMap::new());
                }
            }
            JobStatus::Pending | JobStatus::Running { .. } | JobStatus::Cancelled => {}
        }
    }

    // ---- Broker -------------------------------------------------------------

    pub fn subscribe(&self, topic_pattern: impl Into<String>) -> crate::broker::Subscription {
        self.broker.subscribe(topic_pattern)
    }

    pub fn publish(&self, topic: &str, payload: Value, key: Option<String>, headers: HashMap<String, String>) {
        self.cache.invalidate(topic);
        self.broker.publish(topic, payload, key, headers);
    }

    // ---- Peer forwarding ------------------------------------------------

    async fn peer_for(&self, address: &Address) -> Result<(Arc<dyn PeerConnection>, Address), HubError> {
        let (hub_id, rest) = address.route.next_hop().ok_or_else(|| HubError::UnknownDevice(address.to_string()))?;
        let connection = self.peers.read().get(hub_id).cloned().ok_or_else(|| HubError::UnknownPeer(hub_id.to_string()))?;
        Ok((connection, Address { route: rest, device: address.device.clone() }))
    }

    async fn round_trip(&self, connection: &Arc<dyn PeerConnection>, message: DeviceMessage, ctx: &ExecutionContext) -> Result<Value, HubError> {
        let correlation_id = message.correlation_id().cloned().unwrap_or_else(CorrelationId::new);
        let envelope = Envelope::for_message(correlation_id.to_string(), &message).map_err(|e| HubError::TransactionFailed(e.to_string()))?;
        connection.send(envelope, Qos::AtLeastOnce, ctx, Some(Duration::from_secs(30))).await?;
        let reply = connection
            .receive(ctx, Some(Duration::from_secs(30)))
            .await?
            .ok_or_else(|| HubError::PeerDisconnected("no reply received".into()))?;
        match reply.decode_message().map_err(|e| HubError::TransactionFailed(e.to_string()))? {
            DeviceMessage::Response { result, .. } => result.map_err(HubError::Fault),
            other => Err(HubError::TransactionFailed(format!("unexpected peer reply: {other:?}"))),
        }
    }

    async fn peer_read(&self, address: &Address, name: &str, ctx: &ExecutionContext) -> Result<Value, HubError> {
        let (connection, remote) = self.peer_for(address).await?;
        let message = DeviceMessage::ReadProperty { correlation_id: CorrelationId::new(), address: remote, property: name.to_string(), context: ctx.clone() };
        self.round_trip(&connection, message, ctx).await
    }

    async fn peer_write(&self, address: &Address, name: &str, value: Value, ctx: &ExecutionContext) -> Result<(), HubError> {
        let (connection, remote) = self.peer_for(address).await?;
        let message = DeviceMessage::WriteProperty { correlation_id: CorrelationId::new(), address: remote, property: name.to_string(), value, context: ctx.clone() };
        self.round_trip(&connection, message, ctx).await.map(|_| ())
    }

    async fn peer_execute(&self, address: &Address, action: &str, input: Value, ctx: &ExecutionContext) -> Result<ExecutionResult, HubError> {
        let (connection, remote) = self.peer_for(address).await?;
        let message = DeviceMessage::ExecuteAction { correlation_id: CorrelationId::new(), address: remote, action: action.to_string(), input, context: ctx.clone() };
        let output = self.round_trip(&connection, message, ctx).await?;
        Ok(ExecutionResult::Immediate(JobStatus::Succeeded { output }))
    }
}

fn terminal_status(outcome: Result<Value, TransactionError>) -> JobStatus {
    match outcome {
        Ok(output) => JobStatus::Succeeded { output },
        Err(TransactionError::Fault(fault)) => JobStatus::Faulted { fault },
        Err(other) => JobStatus::Failed { failure: other.into() },
    }
}

fn is_stateful(entry: &DeviceEntry) -> bool {
    entry.supervisor.blueprint().features.values().any(|f| matches!(f, Feature::Stateful { .. }))
}

fn epoch_iso(clock: &DynClock) -> String {
    let ms = clock.epoch_ms();
    let secs = ms / 1000;
    let millis = ms % 1000;
    let days = secs / 86_400;
    let time_of_day = secs % 86_400;
    let (h, m, s) = (time_of_day / 3600, (time_of_day % 3600) / 60, time_of_day % 60);
    let (y, mo, d) = civil_from_days(days as i64);
    format!("{y:04}-{mo:02}-{d:02}T{h:02}:{m:02}:{s:02}.{millis:03}Z")
}

/// Days-since-epoch to (year, month, day), Howard Hinnant's
/// `civil_from_days` algorithm — used so `epoch_iso` needs no extra
/// calendar dependency beyond the clock's millisecond counter.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    (if m <= 2 { y + 1 } else { y }, m, d)
}

fn validate(rules: &[ValidationRule], value: &Value) -> Result<(), DeviceFault> {
    for rule in rules {
        let ok = match rule {
            ValidationRule::Range { min, max } => value.as_f64().is_some_and(|n| n >= *min && n <= *max),
            ValidationRule::MaxLength { max } => value.as_str().is_some_and(|s| s.len() <= *max),
            ValidationRule::Regex { pattern } => {
                let re = regex::Regex::new(pattern).map_err(|e| DeviceFault::ValidationError { message: e.to_string() })?;
                value.as_str().is_some_and(|s| re.is_match(s))
            }
            ValidationRule::OneOf { values } => values.contains(value),
        };
        if !ok {
            return Err(DeviceFault::ValidationError { message: format!("value {value} violates rule {rule:?}") });
        }
    }
    Ok(())
}

#[async_trait]
impl ActionSink for DeviceHub {
    async fn attach(
        &self,
        device: &str,
        blueprint_id: &str,
        blueprint_version: Option<&str>,
        config: &Value,
        ctx: &ExecutionContext,
    ) -> Result<(), TransactionError> {
        self.attach(&Address::local(device), &BlueprintId::new(blueprint_id), blueprint_version, config.clone(), ctx)
            .await
            .map(|_| ())
            .map_err(hub_to_txn)
    }

    async fn detach(&self, device: &str, ctx: &ExecutionContext) -> Result<(), TransactionError> {
        self.detach(&Address::local(device), ctx).await.map(|_| ()).map_err(hub_to_txn)
    }

    async fn start(&self, device: &str, ctx: &ExecutionContext) -> Result<(), TransactionError> {
        self.start(&Address::local(device), ctx).await.map(|_| ()).map_err(hub_to_txn)
    }

    async fn stop(&self, device: &str, ctx: &ExecutionContext) -> Result<(), TransactionError> {
        self.stop(&Address::local(device), ctx).await.map(|_| ()).map_err(hub_to_txn)
    }

    async fn write_property(&self, device: &str, property: &str, value: &Value, ctx: &ExecutionContext) -> Result<(), TransactionError> {
        self.write_property(&Address::local(device), property, value.clone(), ctx).await.map_err(hub_to_txn)
    }

    async fn invoke_action(&self, device: &str, action: &str, input: &Value, ctx: &ExecutionContext) -> Result<Value, TransactionError> {
        let entry = self.lookup(&DeviceName::new(device)).map_err(hub_to_txn)?;
        let handler = entry.action_handler.read().clone();
        match handler {
            Some(handler) => handler.invoke(action, input, ctx).await.map_err(TransactionError::Fault),
            None => Err(TransactionError::Fault(DeviceFault::NotFound { what: format!("action handler for '{device}.{action}'") })),
        }
    }
}

fn hub_to_txn(err: HubError) -> TransactionError {
    match err {
        HubError::Fault(fault) => TransactionError::Fault(fault),
        other => TransactionError::Failure(SerializableDeviceFailure::new(dcc_core::FailureKind::Other, other.to_string())),
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
