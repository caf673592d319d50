// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::address::Address;

#[test]
fn correlation_id_round_trips_through_read_property() {
    let msg = DeviceMessage::ReadProperty {
        correlation_id: CorrelationId::new(),
        address: Address::local("sensor-1"),
        property: "temperature".into(),
        context: ExecutionContext::default(),
    };
    assert!(msg.correlation_id().is_some());
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["type"], "ReadProperty");
}

#[test]
fn publish_and_event_have_no_correlation_id() {
    let publish = DeviceMessage::Publish { topic: "a.b".into(), payload: serde_json::json!(null) };
    assert!(publish.correlation_id().is_none());
    let event = DeviceMessage::Event { topic: "a.b".into(), payload: serde_json::json!(null) };
    assert!(event.correlation_id().is_none());
}

#[test]
fn core_error_into_device_fault_preserves_fault_variant() {
    let fault = DeviceFault::NotFound { what: "device".into() };
    let err: CoreError = fault.clone().into();
    let back: DeviceFault = err.into();
    assert_eq!(back, fault);
}

#[test]
fn core_error_cancelled_maps_to_generic_fault() {
    let err = CoreError::Cancelled;
    let fault: DeviceFault = err.into();
    assert_eq!(fault.code(), "CANCELLED");
}
