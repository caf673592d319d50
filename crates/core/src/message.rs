// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-level device messages: the tagged union that crosses
//! a hub boundary, independent of the transport framing
//! (`dcc-hub::wire` length-prefixes and frames these).

use crate::address::Address;
use crate::error::{CoreError, DeviceFault};
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Correlates a request with its response/events across an async boundary.
    pub struct CorrelationId("cor-");
}

/// Who/what a request is made on behalf of, threaded through for
/// permission checks and audit breadcrumbs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// The tagged union of messages exchanged with a `DeviceHub`. Every
/// variant carries an explicit `type` discriminator for wire encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeviceMessage {
    ReadProperty {
        correlation_id: CorrelationId,
        address: Address,
        property: String,
        context: ExecutionContext,
    },
    WriteProperty {
        correlation_id: CorrelationId,
        address: Address,
        property: String,
        value: Value,
        context: ExecutionContext,
    },
    ExecuteAction {
        correlation_id: CorrelationId,
        address: Address,
        action: String,
        input: Value,
        context: ExecutionContext,
    },
    Subscribe {
        correlation_id: CorrelationId,
        topic: String,
        context: ExecutionContext,
    },
    Unsubscribe {
        correlation_id: CorrelationId,
        topic: String,
    },
    Publish {
        topic: String,
        payload: Value,
    },
    Response {
        correlation_id: CorrelationId,
        result: Result<Value, DeviceFault>,
    },
    Event {
        topic: String,
        payload: Value,
    },
    Error {
        correlation_id: Option<CorrelationId>,
        message: String,
    },
}

impl DeviceMessage {
    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        match self {
            DeviceMessage::ReadProperty { correlation_id, .. }
            | DeviceMessage::WriteProperty { correlation_id, .. }
            | DeviceMessage::ExecuteAction { correlation_id, .. }
            | DeviceMessage::Subscribe { correlation_id, .. }
            | DeviceMessage::Unsubscribe { correlation_id, .. }
            | DeviceMessage::Response { correlation_id, .. } => Some(correlation_id),
            DeviceMessage::Error { correlation_id, .. } => correlation_id.as_ref(),
            DeviceMessage::Publish { .. } | DeviceMessage::Event { .. } => None,
        }
    }
}

impl From<CoreError> for DeviceFault {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Fault(fault) => fault,
            CoreError::Failure(failure) => {
                DeviceFault::Generic { code: "INTERNAL_FAILURE".into(), message: failure.to_string(), details: Value::Null }
            }
            CoreError::Cancelled => DeviceFault::Generic { code: "CANCELLED".into(), message: "operation cancelled".into(), details: Value::Null },
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
