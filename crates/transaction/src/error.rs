// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors and the final report a `Coordinator::execute` call produces
//!.

use dcc_core::{DeviceFault, SerializableDeviceFailure};
use thiserror::Error;

/// Why a single node (leaf or branch) stopped executing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransactionError {
    #[error(transparent)]
    Fault(#[from] DeviceFault),
    #[error(transparent)]
    Failure(#[from] SerializableDeviceFailure),
    #[error("node timed out")]
    TimedOut,
    #[error("plan deadline exceeded")]
    DeadlineExceeded,
    #[error("cancelled")]
    Cancelled,
}

impl From<TransactionError> for SerializableDeviceFailure {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Failure(f) => f,
            TransactionError::Fault(f) => SerializableDeviceFailure::new(dcc_core::FailureKind::Other, f.to_string()),
            TransactionError::TimedOut => SerializableDeviceFailure::new(dcc_core::FailureKind::Other, "node timed out"),
            TransactionError::DeadlineExceeded => {
                SerializableDeviceFailure::new(dcc_core::FailureKind::Other, "plan deadline exceeded")
            }
            TransactionError::Cancelled => {
                SerializableDeviceFailure::new(dcc_core::FailureKind::CancelledBySupervisor, "cancelled")
            }
        }
    }
}

/// Outcome of unwinding the undo log: either every compensation ran (or
/// was deliberately skipped under `CONTINUE_AND_FLAG`), or an `ABORT`
/// compensation failure stopped the unwind partway.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RollbackReport {
    /// At least one `CONTINUE_AND_FLAG` compensation failed; the plan's
    /// overall failure should be annotated as degraded.
    pub degraded: bool,
    /// An `ABORT`-policy compensation itself failed; rollback stopped
    /// before reaching the bottom of the stack. Operator intervention is
    /// required to reconcile device state.
    pub needs_manual_intervention: bool,
}

impl RollbackReport {
    pub fn merge(&mut self, other: RollbackReport) {
        self.degraded |= other.degraded;
        self.needs_manual_intervention |= other.needs_manual_intervention;
    }
}

/// The final result of running a `TransactionPlan` end to end.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionReport {
    pub error: Option<TransactionError>,
    pub rollback: RollbackReport,
}

impl TransactionReport {
    pub fn success() -> Self {
        Self { error: None, rollback: RollbackReport::default() }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
