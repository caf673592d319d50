// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fault_converts_via_from() {
    let fault = DeviceFault::NotFound { what: "device".into() };
    let err: HubError = fault.clone().into();
    assert_eq!(err, HubError::Fault(fault));
}

#[test]
fn unknown_device_message_includes_the_name() {
    let err = HubError::UnknownDevice("boiler.pump-1".into());
    assert!(err.to_string().contains("boiler.pump-1"));
}
