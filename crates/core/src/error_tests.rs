// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fault_code_matches_serde_tag() {
    let fault = DeviceFault::InvalidState {
        current_state: "Running".into(),
        required_state: "Stopped".into(),
        operation: "restore".into(),
    };
    assert_eq!(fault.code(), "INVALID_STATE");
    let json = serde_json::to_value(&fault).unwrap();
    assert_eq!(json["code"], "INVALID_STATE");
}

#[test]
fn failure_display_includes_cause_chain() {
    let root = SerializableDeviceFailure::new(FailureKind::Io, "disk full");
    let wrapped = SerializableDeviceFailure::new(FailureKind::Driver, "flush failed").caused_by(root);
    let rendered = wrapped.to_string();
    assert!(rendered.contains("flush failed"));
    assert!(rendered.contains("disk full"));
}

#[test]
fn outcome_cancelled_is_not_success() {
    let outcome: Outcome<()> = Outcome::Cancelled;
    assert!(!outcome.is_success());
    assert!(matches!(outcome.into_result(), Err(CoreError::Cancelled)));
}

#[test]
fn outcome_fault_converts_to_core_error() {
    let outcome: Outcome<()> = Outcome::Fault(DeviceFault::AuthenticationFailed);
    match outcome.into_result() {
        Err(CoreError::Fault(DeviceFault::AuthenticationFailed)) => {}
        other => panic!("unexpected: {other:?}"),
    }
}
