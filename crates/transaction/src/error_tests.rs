// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn success_report_has_no_error_and_clean_rollback() {
    let report = TransactionReport::success();
    assert!(report.is_success());
    assert!(!report.rollback.degraded);
    assert!(!report.rollback.needs_manual_intervention);
}

#[test]
fn rollback_report_merge_is_sticky() {
    let mut a = RollbackReport { degraded: true, needs_manual_intervention: false };
    let b = RollbackReport { degraded: false, needs_manual_intervention: true };
    a.merge(b);
    assert!(a.degraded);
    assert!(a.needs_manual_intervention);
}

#[test]
fn fault_failure_and_cancelled_convert_to_failure_kinds() {
    let fault = TransactionError::Fault(DeviceFault::ValidationError { message: "bad".into() });
    let failure: SerializableDeviceFailure = fault.into();
    assert_eq!(failure.kind, dcc_core::FailureKind::Other);

    let cancelled: SerializableDeviceFailure = TransactionError::Cancelled.into();
    assert_eq!(cancelled.kind, dcc_core::FailureKind::CancelledBySupervisor);
}
