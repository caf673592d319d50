// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dcc_core::RestartStrategy;

fn linear_policy(max_attempts: i64, base_ms: u64, reset_on_success: bool) -> RestartPolicy {
    RestartPolicy { max_attempts, strategy: RestartStrategy::Linear { base: Duration::from_millis(base_ms) }, reset_on_success }
}

#[test]
fn scenario_restart_policy_linear_backoff_then_permanent_failure() {
    // maxAttempts=3, Linear(100ms); attempts at t=100,200,300ms; after the
    // 3rd failure, remains Failed.
    let supervisor = RestartSupervisor::new(linear_policy(3, 100, true));
    assert_eq!(supervisor.next_delay(), Some(Duration::from_millis(100)));
    assert_eq!(supervisor.next_delay(), Some(Duration::from_millis(200)));
    assert_eq!(supervisor.next_delay(), Some(Duration::from_millis(300)));
    assert_eq!(supervisor.next_delay(), None);
}

#[test]
fn reset_on_success_restarts_the_backoff_sequence() {
    let supervisor = RestartSupervisor::new(linear_policy(3, 100, true));
    assert_eq!(supervisor.next_delay(), Some(Duration::from_millis(100)));
    assert_eq!(supervisor.next_delay(), Some(Duration::from_millis(200)));
    supervisor.on_successful_dwell();
    assert_eq!(supervisor.attempt_count(), 0);
    assert_eq!(supervisor.next_delay(), Some(Duration::from_millis(100)));
}

#[test]
fn without_reset_on_success_the_counter_keeps_climbing() {
    let supervisor = RestartSupervisor::new(linear_policy(5, 100, false));
    supervisor.next_delay();
    supervisor.next_delay();
    supervisor.on_successful_dwell();
    assert_eq!(supervisor.attempt_count(), 2);
}

#[yare::parameterized(
    unbounded_zero = { 0 },
    unbounded_negative = { -1 },
)]
fn nonpositive_max_attempts_is_unbounded(max_attempts: i64) {
    let supervisor = RestartSupervisor::new(linear_policy(max_attempts, 10, false));
    for _ in 0..50 {
        assert!(supervisor.next_delay().is_some());
    }
}
