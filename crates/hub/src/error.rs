// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors the hub surfaces to `DeviceHub` callers.

use dcc_core::{BlueprintId, DeviceFault};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HubError {
    #[error(transparent)]
    Fault(#[from] DeviceFault),

    #[error("device '{0}' not found")]
    UnknownDevice(String),

    #[error("blueprint {0} not found")]
    UnknownBlueprint(BlueprintId),

    #[error("no peer connection named '{0}'")]
    UnknownPeer(String),

    #[error("peer '{0}' is not connected")]
    PeerDisconnected(String),

    #[error("lifecycle FSM rejected the request: {0}")]
    IllegalTransition(String),

    #[error("transaction plan failed: {0}")]
    TransactionFailed(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
