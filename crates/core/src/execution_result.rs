// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action/plan execution results: an invocation either
//! resolves immediately or hands back a handle whose progress is observed
//! as a stream of `JobStatus` updates.

use crate::error::{DeviceFault, SerializableDeviceFailure};
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Identifies a single in-flight or completed plan/action execution.
    pub struct ExecutionId("exe-");
}

/// Snapshot of an in-flight or completed execution, the unit pushed on the
/// hot status stream an `ExecutionResult::Deferred` exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum JobStatus {
    Pending,
    Running { progress: Option<f32> },
    Succeeded { output: Value },
    Faulted { fault: DeviceFault },
    Failed { failure: SerializableDeviceFailure },
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded { .. } | JobStatus::Faulted { .. } | JobStatus::Failed { .. } | JobStatus::Cancelled)
    }
}

/// Result of dispatching an action or plan: either it completed inline,
/// or the caller gets an id plus a hot stream of its `JobStatus` to track.
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    Immediate(JobStatus),
    Deferred { execution_id: ExecutionId, status: tokio::sync::watch::Receiver<JobStatus> },
}

impl ExecutionResult {
    pub fn execution_id(&self) -> Option<&ExecutionId> {
        match self {
            ExecutionResult::Deferred { execution_id, .. } => Some(execution_id),
            ExecutionResult::Immediate(_) => None,
        }
    }
}

// `watch::Receiver` carries no meaningful equality of its own, so two
// `Deferred` handles are equal when they track the same execution.
impl PartialEq for ExecutionResult {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExecutionResult::Immediate(a), ExecutionResult::Immediate(b)) => a == b,
            (ExecutionResult::Deferred { execution_id: a, .. }, ExecutionResult::Deferred { execution_id: b, .. }) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "execution_result_tests.rs"]
mod tests;
