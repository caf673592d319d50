// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two-axis error taxonomy: predictable, serializable `DeviceFault`s
//! returned as regular responses, and unexpected `DeviceFailure`s that move
//! the lifecycle FSM to `Failed`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A predictable, serializable business outcome carrying a stable code and
/// structured details. Does NOT move the owning device's lifecycle FSM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "code")]
pub enum DeviceFault {
    #[error("validation error: {message}")]
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError { message: String },

    #[error("precondition failed: {message}")]
    #[serde(rename = "PRECONDITION_FAILED")]
    PreconditionFailed { message: String },

    #[error("resource busy: {resource}")]
    #[serde(rename = "RESOURCE_BUSY")]
    ResourceBusy { resource: String },

    #[error("timeout after {elapsed_ms}ms")]
    #[serde(rename = "TIMEOUT")]
    Timeout { elapsed_ms: u64 },

    #[error("not found: {what}")]
    #[serde(rename = "NOT_FOUND")]
    NotFound { what: String },

    #[error("authentication failed")]
    #[serde(rename = "AUTHENTICATION_FAILED")]
    AuthenticationFailed,

    #[error("authorization denied: {action}")]
    #[serde(rename = "AUTHORIZATION_DENIED")]
    AuthorizationDenied { action: String },

    #[error("invalid state: device is {current_state}, requires {required_state} for {operation}")]
    #[serde(rename = "INVALID_STATE")]
    InvalidState { current_state: String, required_state: String, operation: String },

    #[error("{message}")]
    #[serde(rename = "GENERIC")]
    Generic { code: String, message: String, #[serde(default)] details: serde_json::Value },
}

impl DeviceFault {
    /// The stable `code` tag, independent of the serde rename attribute
    /// (useful for logging fields / cache invalidation keys).
    pub fn code(&self) -> &str {
        match self {
            DeviceFault::ValidationError { .. } => "VALIDATION_ERROR",
            DeviceFault::PreconditionFailed { .. } => "PRECONDITION_FAILED",
            DeviceFault::ResourceBusy { .. } => "RESOURCE_BUSY",
            DeviceFault::Timeout { .. } => "TIMEOUT",
            DeviceFault::NotFound { .. } => "NOT_FOUND",
            DeviceFault::AuthenticationFailed => "AUTHENTICATION_FAILED",
            DeviceFault::AuthorizationDenied { .. } => "AUTHORIZATION_DENIED",
            DeviceFault::InvalidState { .. } => "INVALID_STATE",
            DeviceFault::Generic { code, .. } => code,
        }
    }
}

/// An unexpected error: I/O exceptions, peer disconnections, unrecoverable
/// driver errors, cancellation by supervisor. Surfaced as
/// `SerializableDeviceFailure` and moves the FSM to `Failed` when raised
/// during a transient lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableDeviceFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<SerializableDeviceFailure>>,
}

impl fmt::Display for SerializableDeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

impl std::error::Error for SerializableDeviceFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn std::error::Error + 'static))
    }
}

impl SerializableDeviceFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), cause: None }
    }

    pub fn caused_by(mut self, cause: SerializableDeviceFailure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Io,
    PeerDisconnected,
    Driver,
    CancelledBySupervisor,
    CircuitBreakerTripped,
    Other,
}

crate::simple_display! {
    FailureKind {
        Io => "io",
        PeerDisconnected => "peer_disconnected",
        Driver => "driver",
        CancelledBySupervisor => "cancelled_by_supervisor",
        CircuitBreakerTripped => "circuit_breaker_tripped",
        Other => "other",
    }
}

/// Outcome of an operation that may fault, fail, or be cancelled —
/// cancellation is a distinct third outcome, not folded into failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Fault(DeviceFault),
    Failure(SerializableDeviceFailure),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<T, CoreError> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Fault(f) => Err(CoreError::Fault(f)),
            Outcome::Failure(f) => Err(CoreError::Failure(f)),
            Outcome::Cancelled => Err(CoreError::Cancelled),
        }
    }
}

/// Unified error type at crate API boundaries.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Fault(#[from] DeviceFault),
    #[error(transparent)]
    Failure(#[from] SerializableDeviceFailure),
    #[error("cancelled")]
    Cancelled,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
