// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core data model and ambient primitives for the composite device control
//! runtime: the lifecycle FSM, error taxonomy, addressing, blueprints, the
//! transaction plan AST, wire messages, and the id/clock/macro
//! abstractions the other `dcc-*` crates build on.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

#[macro_use]
pub mod macros;

pub mod address;
pub mod blueprint;
pub mod breadcrumb;
pub mod clock;
pub mod error;
pub mod execution_result;
pub mod id;
pub mod lifecycle_state;
pub mod message;
pub mod plan;
pub mod state_value;

pub use address::{Address, DeviceName, Route};
pub use blueprint::{
    ActionDescriptor, AddressSource, AlarmDescriptor, BlueprintId, CachePolicy, CacheScope, ChildComponentConfig,
    ChildDeviceErrorHandler, ChildLifecycleConfig, DataType, DeviceBlueprint, FailoverStrategy, Feature, LifecycleMode,
    LifecyclePlans, MetricsConfig, OperationalEventTypes, PeerBlueprint, PropertyBinding, PropertyDescriptor, RestartPolicy,
    RestartStrategy, StreamDescriptor, TransformerDescriptor, ValidationRule,
};
pub use breadcrumb::{Breadcrumb, BreadcrumbTrail, DEFAULT_BREADCRUMB_CAPACITY};
pub use clock::{Clock, ClockObject, DynClock, FakeClock, SystemClock};
pub use error::{CoreError, DeviceFault, FailureKind, Outcome, SerializableDeviceFailure};
pub use execution_result::{ExecutionId, ExecutionResult, JobStatus};
pub use id::IdBuf;
pub use lifecycle_state::{DeviceLifecycleEvent, IllegalTransition, LifecycleState};
pub use message::{CorrelationId, DeviceMessage, ExecutionContext};
pub use plan::{
    ActionSpec, CompensationOrder, CompensationPolicy, CompensationPolicyField, FailureStrategy, LockMode, PlanNode,
    ResourceLockSpec, RetryPolicy, TransactionPlan,
};
pub use state_value::{Quality, StateValue};
