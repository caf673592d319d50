// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::error::FailureKind;

#[test]
fn attach_start_round_trip_walks_the_graph() {
    let mut state = LifecycleState::Detached;
    state = state.apply(&DeviceLifecycleEvent::Attach).unwrap();
    assert_eq!(state, LifecycleState::Attaching);
    state = state.apply(&DeviceLifecycleEvent::TransitionOk).unwrap();
    assert_eq!(state, LifecycleState::Stopped);
    state = state.apply(&DeviceLifecycleEvent::Start).unwrap();
    assert_eq!(state, LifecycleState::Starting);
    state = state.apply(&DeviceLifecycleEvent::TransitionOk).unwrap();
    assert_eq!(state, LifecycleState::Running);
}

#[test]
fn fail_from_any_non_terminal_state_goes_to_failed() {
    let failure = DeviceLifecycleEvent::Fail {
        failure: SerializableDeviceFailure::new(FailureKind::Io, "boom"),
    };
    for state in [
        LifecycleState::Attaching,
        LifecycleState::Starting,
        LifecycleState::Running,
        LifecycleState::Stopping,
        LifecycleState::Detaching,
    ] {
        assert_eq!(state.apply(&failure).unwrap(), LifecycleState::Failed);
    }
}

#[test]
fn fail_from_detached_or_stopped_is_illegal() {
    let failure = DeviceLifecycleEvent::Fail {
        failure: SerializableDeviceFailure::new(FailureKind::Io, "boom"),
    };
    assert!(LifecycleState::Detached.apply(&failure).is_err());
    assert!(LifecycleState::Stopped.apply(&failure).is_err());
}

#[test]
fn reset_only_applies_from_failed() {
    assert_eq!(
        LifecycleState::Failed.apply(&DeviceLifecycleEvent::Reset).unwrap(),
        LifecycleState::Stopped
    );
    assert!(LifecycleState::Running.apply(&DeviceLifecycleEvent::Reset).is_err());
}

#[test]
fn detach_applies_from_stopped_or_failed_only() {
    assert!(LifecycleState::Stopped.apply(&DeviceLifecycleEvent::Detach).is_ok());
    assert!(LifecycleState::Failed.apply(&DeviceLifecycleEvent::Detach).is_ok());
    assert!(LifecycleState::Running.apply(&DeviceLifecycleEvent::Detach).is_err());
}

#[test]
fn detached_is_the_only_terminal_state() {
    assert!(LifecycleState::Detached.is_terminal());
    assert!(!LifecycleState::Stopped.is_terminal());
}

#[test]
fn transient_states_match_spec_list() {
    for s in [LifecycleState::Attaching, LifecycleState::Starting, LifecycleState::Stopping, LifecycleState::Detaching] {
        assert!(s.is_transient());
    }
    for s in [LifecycleState::Detached, LifecycleState::Stopped, LifecycleState::Running, LifecycleState::Failed] {
        assert!(!s.is_transient());
    }
}
