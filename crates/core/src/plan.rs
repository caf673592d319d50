// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transaction plan AST: a `TransactionPlan` is a tree
//! of `PlanNode`s the Transaction Coordinator walks, with Saga-style
//! compensation recorded as a LIFO undo log. Every node — leaf or branch —
//! carries the same common envelope (`idempotencyKey`, `compensation`,
//! `compensationPolicy`, `timeout`, `retry`); only the node-specific shape
//! varies in `ActionSpec`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A resource a leaf action must hold for its duration.
/// Locks are always acquired in a stable sorted order across a plan to
/// avoid deadlock between concurrently executing plans.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceLockSpec {
    pub resource_id: String,
    pub mode: LockMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockMode {
    SharedRead,
    ExclusiveWrite,
}

/// What to do when a node's own compensation plan itself fails during
/// rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompensationPolicy {
    /// Abort the whole plan and unwind the undo log.
    Abort,
    /// Record the fault, flag the plan as degraded, keep going.
    ContinueAndFlag,
    /// Retry the failed node per its `RetryPolicy` before falling back to
    /// `Abort` semantics.
    Retry,
}

/// How a `Parallel` branch's failures are combined into the node's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureStrategy {
    /// Cancel siblings and fail the branch on the first failure.
    FailFast,
    /// Run every sibling to completion regardless of failures, then fail
    /// the branch if any failed.
    CollectAll,
    /// Run every sibling to completion; the branch succeeds if at least
    /// one did.
    BestEffort,
}

/// How a `Parallel` node's compensations run during rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationOrder {
    /// Run compensations for completed branches one at a time, in reverse
    /// completion order.
    SequentialReverse,
    /// Run all branch compensations concurrently.
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(with = "duration_ms")]
    pub backoff: Duration,
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

mod opt_duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        d.map(|d| d.as_millis()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let millis: Option<u64> = Option::deserialize(d)?;
        Ok(millis.map(Duration::from_millis))
    }
}

/// The node-specific shape: leaves translate directly to a hub operation;
/// composites recurse into child `PlanNode`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionSpec {
    Sequence {
        steps: Vec<PlanNode>,
    },
    Parallel {
        branches: Vec<PlanNode>,
        failure_strategy: FailureStrategy,
        compensation_order: CompensationOrder,
    },
    Attach {
        device: String,
        blueprint_id: String,
        #[serde(default)]
        blueprint_version: Option<String>,
        #[serde(default)]
        config: serde_json::Value,
    },
    Detach {
        device: String,
    },
    Start {
        device: String,
    },
    Stop {
        device: String,
    },
    WriteProperty {
        device: String,
        property: String,
        value: serde_json::Value,
    },
    /// Invoke a blueprint-declared action on a device.
    InvokeAction {
        device: String,
        action: String,
        #[serde(default)]
        input: serde_json::Value,
    },
}

impl ActionSpec {
    /// Resource locks a leaf node requires. Branch nodes report the union
    /// of their children's locks, de-duplicated but not re-sorted — the
    /// coordinator sorts the full plan's lock set once at acquisition time.
    pub fn direct_locks(&self) -> Vec<ResourceLockSpec> {
        match self {
            ActionSpec::WriteProperty { device, .. } | ActionSpec::InvokeAction { device, .. } => {
                vec![ResourceLockSpec { resource_id: device.clone(), mode: LockMode::ExclusiveWrite }]
            }
            ActionSpec::Attach { device, .. }
            | ActionSpec::Detach { device }
            | ActionSpec::Start { device }
            | ActionSpec::Stop { device } => {
                vec![ResourceLockSpec { resource_id: device.clone(), mode: LockMode::ExclusiveWrite }]
            }
            ActionSpec::Sequence { steps } => steps.iter().flat_map(|n| n.spec.direct_locks()).collect(),
            ActionSpec::Parallel { branches, .. } => branches.iter().flat_map(|n| n.spec.direct_locks()).collect(),
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, ActionSpec::Sequence { .. } | ActionSpec::Parallel { .. })
    }
}

/// One node of a `TransactionPlan`: the node-specific `ActionSpec` plus the
/// common envelope every node carries — an optional idempotency key,
/// compensation plan and policy, timeout, and retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
    pub spec: ActionSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// A plan that semantically undoes this node if it later needs
    /// unwinding. Boxed because `TransactionPlan` recursively contains
    /// `PlanNode`s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compensation: Option<Box<TransactionPlan>>,
    #[serde(default)]
    pub compensation_policy: CompensationPolicyField,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_duration_ms")]
    pub timeout: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

impl PlanNode {
    /// Construct a node with no compensation, default `Abort` policy, no
    /// timeout or retry — the common case for a plain leaf.
    pub fn leaf(spec: ActionSpec) -> Self {
        Self {
            spec,
            idempotency_key: None,
            compensation: None,
            compensation_policy: CompensationPolicyField::default(),
            timeout: None,
            retry: None,
        }
    }

    pub fn with_compensation(mut self, compensation: TransactionPlan) -> Self {
        self.compensation = Some(Box::new(compensation));
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_compensation_policy(mut self, policy: CompensationPolicy) -> Self {
        self.compensation_policy = CompensationPolicyField(policy);
        self
    }
}

/// Wraps `CompensationPolicy` with serde default `Abort`, since
/// `CompensationPolicy` itself has no canonical default (every node must
/// make the choice explicit when hand-authored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompensationPolicyField(pub CompensationPolicy);

impl Default for CompensationPolicyField {
    fn default() -> Self {
        CompensationPolicyField(CompensationPolicy::Abort)
    }
}

/// A named transaction: the root `PlanNode` plus a plan-level deadline
///.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPlan {
    pub name: String,
    pub root: PlanNode,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_duration_ms")]
    pub deadline: Option<Duration>,
}

impl TransactionPlan {
    pub fn new(name: impl Into<String>, root: PlanNode) -> Self {
        Self { name: name.into(), root, deadline: None }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
