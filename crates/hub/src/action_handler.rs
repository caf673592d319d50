// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The extension seam a device's `execute()` dispatch runs through
//!: concrete protocol adapters and device drivers are
//! out of scope, so a device's named actions are served by whatever
//! [`ActionHandler`] the embedder registers for it, the same
//! register-by-address shape as [`PeerDriver`](crate::peer::PeerDriver).
//! A device with no registered handler faults every `execute()` call with
//! `NOT_FOUND` rather than panicking or silently no-opping.

use async_trait::async_trait;
use dcc_core::{DeviceFault, ExecutionContext};
use serde_json::Value;

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn invoke(&self, action: &str, input: &Value, ctx: &ExecutionContext) -> Result<Value, DeviceFault>;
}

/// An [`ActionHandler`] that echoes its input back as output, useful for
/// wiring up tests and demos without a real driver.
pub struct EchoActionHandler;

#[async_trait]
impl ActionHandler for EchoActionHandler {
    async fn invoke(&self, _action: &str, input: &Value, _ctx: &ExecutionContext) -> Result<Value, DeviceFault> {
        Ok(input.clone())
    }
}

#[cfg(test)]
#[path = "action_handler_tests.rs"]
mod tests;
