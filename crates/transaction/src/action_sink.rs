// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The seam between the coordinator and the hub: leaf nodes translate to
//! operations on this trait rather than calling `dcc-hub` directly, so
//! `dcc-transaction` has no dependency on `dcc-hub` (which itself depends
//! on the coordinator to run lifecycle plans). Leaf nodes translate to hub
//! operations on the referenced address through this seam.

use crate::error::TransactionError;
use async_trait::async_trait;
use dcc_core::ExecutionContext;
use serde_json::Value;

#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn attach(
        &self,
        device: &str,
        blueprint_id: &str,
        blueprint_version: Option<&str>,
        config: &Value,
        ctx: &ExecutionContext,
    ) -> Result<(), TransactionError>;

    async fn detach(&self, device: &str, ctx: &ExecutionContext) -> Result<(), TransactionError>;

    async fn start(&self, device: &str, ctx: &ExecutionContext) -> Result<(), TransactionError>;

    async fn stop(&self, device: &str, ctx: &ExecutionContext) -> Result<(), TransactionError>;

    async fn write_property(
        &self,
        device: &str,
        property: &str,
        value: &Value,
        ctx: &ExecutionContext,
    ) -> Result<(), TransactionError>;

    async fn invoke_action(
        &self,
        device: &str,
        action: &str,
        input: &Value,
        ctx: &ExecutionContext,
    ) -> Result<Value, TransactionError>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fakes {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Records every call it receives and lets a test script a fault for
    /// any given `(verb, device)` pair. Used to drive coordinator tests
    /// without a real hub.
    #[derive(Default)]
    pub struct ScriptedSink {
        pub calls: Mutex<Vec<String>>,
        pub failures: Mutex<HashSet<String>>,
        pub fail_n_times: Mutex<std::collections::HashMap<String, u32>>,
    }

    impl ScriptedSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_always(&self, call: impl Into<String>) {
            self.failures.lock().insert(call.into());
        }

        pub fn fail_n_times_then_succeed(&self, call: impl Into<String>, n: u32) {
            self.fail_n_times.lock().insert(call.into(), n);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn record(&self, call: impl Into<String>) -> Result<(), TransactionError> {
            let call = call.into();
            self.calls.lock().push(call.clone());
            if let Some(remaining) = self.fail_n_times.lock().get_mut(&call) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(TransactionError::Failure(dcc_core::SerializableDeviceFailure::new(
                        dcc_core::FailureKind::Other,
                        "scripted transient failure",
                    )));
                }
            }
            if self.failures.lock().contains(&call) {
                return Err(TransactionError::Failure(dcc_core::SerializableDeviceFailure::new(
                    dcc_core::FailureKind::Other,
                    "scripted failure",
                )));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ActionSink for ScriptedSink {
        async fn attach(
            &self,
            device: &str,
            _blueprint_id: &str,
            _version: Option<&str>,
            _config: &Value,
            _ctx: &ExecutionContext,
        ) -> Result<(), TransactionError> {
            self.record(format!("attach:{device}"))
        }

        async fn detach(&self, device: &str, _ctx: &ExecutionContext) -> Result<(), TransactionError> {
            self.record(format!("detach:{device}"))
        }

        async fn start(&self, device: &str, _ctx: &ExecutionContext) -> Result<(), TransactionError> {
            self.record(format!("start:{device}"))
        }

        async fn stop(&self, device: &str, _ctx: &ExecutionContext) -> Result<(), TransactionError> {
            self.record(format!("stop:{device}"))
        }

        async fn write_property(
            &self,
            device: &str,
            property: &str,
            _value: &Value,
            _ctx: &ExecutionContext,
        ) -> Result<(), TransactionError> {
            self.record(format!("write:{device}.{property}"))
        }

        async fn invoke_action(
            &self,
            device: &str,
            action: &str,
            _input: &Value,
            _ctx: &ExecutionContext,
        ) -> Result<Value, TransactionError> {
            self.record(format!("invoke:{device}.{action}"))?;
            Ok(Value::Null)
        }
    }
}
