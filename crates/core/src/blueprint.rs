// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The declarative device model: blueprints, properties,
//! actions, streams, alarms, children, peer connections, and features.

use crate::plan::TransactionPlan;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Stable string identifier of a blueprint declaration (e.g. reverse-DNS),
/// independent of its semantic `version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlueprintId(pub String);

impl BlueprintId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for BlueprintId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for BlueprintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scalar wire types properties and actions are declared over. Blueprint
/// authoring's concrete serialization format is out of scope here — this
/// is just the minimal type-tag the runtime needs to validate reads,
/// writes, and action inputs/outputs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataType {
    Bool,
    Int,
    Float,
    String,
    Bytes,
    /// Opaque structured payload — actions/properties that don't fit a
    /// scalar wire type (e.g. composite configuration blobs).
    Json,
}

/// A single validation rule evaluated against a property write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationRule {
    Range { min: f64, max: f64 },
    MaxLength { max: usize },
    Regex { pattern: String },
    OneOf { values: Vec<serde_json::Value> },
}

/// Per-property metrics export configuration. Concrete exporters
/// (e.g. Prometheus) are out of scope; this is the schema the
/// exporter adapter consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub metric_name: String,
    #[serde(default)]
    pub labels: IndexMap<String, String>,
}

/// Declares a single property on a blueprint.
///
/// Invariant: `persistent => !transient` (enforced at blueprint
/// registration, see `dcc-registry::blueprint_registry`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub value_type: DataType,
    pub readable: bool,
    pub mutable: bool,
    pub persistent: bool,
    pub transient: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_config: Option<MetricsConfig>,
    #[serde(default)]
    pub validation_rules: Vec<ValidationRule>,
}

impl PropertyDescriptor {
    pub fn is_invariant_satisfied(&self) -> bool {
        !self.persistent || !self.transient
    }
}

/// Named topic a blueprint's action can signal on dispatch/success/failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationalEventTypes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_dispatch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<String>,
}

/// Declares a single action on a blueprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<DataType>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational_event_types: Option<OperationalEventTypes>,
    /// Resources this action must hold for its duration.
    #[serde(default)]
    pub required_locks: Vec<crate::plan::ResourceLockSpec>,
    /// Result caching policy. `None` disables caching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_policy: Option<CachePolicy>,
    /// When set, `execute()` dispatches this action on a detached task and
    /// hands back a `Deferred` handle instead of awaiting completion inline.
    #[serde(default)]
    pub deferred: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheScope {
    PerHub,
    PerPrincipal,
    Global,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachePolicy {
    #[serde(with = "duration_ms")]
    pub ttl: Duration,
    pub scope: CacheScope,
    #[serde(default)]
    pub invalidation_events: Vec<String>,
}

/// A stream a blueprint exposes (e.g. a telemetry feed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    pub value_type: DataType,
}

/// An alarm bound to a predicate property with a retain time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmDescriptor {
    pub name: String,
    pub predicate_property: String,
    #[serde(with = "duration_ms")]
    pub retain: Duration,
}

/// Whether a local child's lifecycle cascades with its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleMode {
    /// Attach/start/stop of the parent cascades to this child.
    Linked,
    /// Unaffected by parent transitions.
    Independent,
}

/// How a parent reacts to a `LINKED` child's failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChildDeviceErrorHandler {
    Ignore,
    Restart,
    StopParent,
    Propagate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildLifecycleConfig {
    pub mode: LifecycleMode,
    pub error_handler: ChildDeviceErrorHandler,
}

/// A rule wiring a parent's value into a child's property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PropertyBinding {
    Const { value: serde_json::Value },
    Source { source_ref: String },
    Transformed { source_ref: String, transformer: TransformerDescriptor },
}

/// Names a registered transformer and its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TransformerDescriptor {
    Linear { scale: f64, offset: f64 },
    ToString,
    /// Extension point for transformers registered by third parties.
    Custom { name: String, #[serde(default)] config: serde_json::Value },
}

/// Declares how a local or remote child device is attached under a parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ChildComponentConfig {
    Local {
        blueprint_id: BlueprintId,
        version: String,
        lifecycle_config: ChildLifecycleConfig,
        #[serde(default)]
        meta_config: IndexMap<String, serde_json::Value>,
        #[serde(default)]
        bindings: IndexMap<String, PropertyBinding>,
    },
    Remote { peer_name: String, remote_device_name: String, blueprint_id: BlueprintId, version: String },
}

/// Where a peer connection's physical addresses come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AddressSource {
    Static { addresses: Vec<String> },
    Discovered { service_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailoverStrategy {
    Ordered,
    Random,
    RoundRobin,
}

/// Describes a peer connection (hub-to-hub link) a blueprint declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerBlueprint {
    pub driver_id: String,
    pub address_source: AddressSource,
    #[serde(default = "default_failover")]
    pub failover: FailoverStrategy,
}

fn default_failover() -> FailoverStrategy {
    FailoverStrategy::Ordered
}

/// Restart backoff strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum RestartStrategy {
    Linear { #[serde(with = "duration_ms")] base: Duration },
    Exponential { #[serde(with = "duration_ms")] base: Duration },
    Fibonacci { #[serde(with = "duration_ms")] base: Duration },
}

impl RestartStrategy {
    /// Delay before the given 1-indexed attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self {
            RestartStrategy::Linear { base } => *base * attempt,
            RestartStrategy::Exponential { base } => {
                let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
                *base * factor
            }
            RestartStrategy::Fibonacci { base } => *base * fibonacci(attempt),
        }
    }
}

fn fibonacci(n: u32) -> u32 {
    let (mut a, mut b) = (1u32, 1u32);
    for _ in 1..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}

/// `maxAttempts <= 0` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestartPolicy {
    pub max_attempts: i64,
    pub strategy: RestartStrategy,
    pub reset_on_success: bool,
}

impl RestartPolicy {
    pub fn is_unbounded(&self) -> bool {
        self.max_attempts <= 0
    }

    pub fn allows_attempt(&self, attempt_number: u32) -> bool {
        self.is_unbounded() || (attempt_number as i64) <= self.max_attempts
    }
}

/// Declarative plans run on entering each transient lifecycle state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LifecyclePlans {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_attach: Option<TransactionPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_start: Option<TransactionPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_stop: Option<TransactionPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_detach: Option<TransactionPlan>,
}

/// A typed capability tag on a blueprint. Third-party
/// capabilities extend this via `Feature::Custom`, validated through the
/// `FeatureValidator` registry (`dcc-registry`) rather than by modifying
/// this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Feature {
    Lifecycle { restart_policy: Option<RestartPolicy> },
    Stateful { state_migrator_id: Option<String> },
    Reconfigurable,
    OperationalFsm { states: Vec<String>, initial: String },
    PlanExecutor,
    BinaryData,
    Alarms,
    Custom { tag: String, #[serde(default)] config: serde_json::Value },
}

impl Feature {
    /// The registry-dispatch tag for this feature.
    pub fn tag(&self) -> &str {
        match self {
            Feature::Lifecycle { .. } => "lifecycle",
            Feature::Stateful { .. } => "stateful",
            Feature::Reconfigurable => "reconfigurable",
            Feature::OperationalFsm { .. } => "operationalFsm",
            Feature::PlanExecutor => "planExecutor",
            Feature::BinaryData => "binaryData",
            Feature::Alarms => "alarms",
            Feature::Custom { tag, .. } => tag,
        }
    }
}

/// Immutable declarative record describing a device type.
///
/// Registered once; `dcc-registry::BlueprintRegistry::resolve` returns the
/// fully inheritance-merged view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceBlueprint {
    pub id: BlueprintId,
    pub version: String,
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<BlueprintId>,
    #[serde(default)]
    pub features: IndexMap<String, Feature>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyDescriptor>,
    #[serde(default)]
    pub actions: IndexMap<String, ActionDescriptor>,
    #[serde(default)]
    pub streams: IndexMap<String, StreamDescriptor>,
    #[serde(default)]
    pub alarms: IndexMap<String, AlarmDescriptor>,
    #[serde(default)]
    pub children: IndexMap<String, ChildComponentConfig>,
    #[serde(default)]
    pub peer_connections: IndexMap<String, PeerBlueprint>,
    #[serde(default)]
    pub lifecycle_plans: LifecyclePlans,
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_millis().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
#[path = "blueprint_tests.rs"]
mod tests;
