// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device Runtime & Lifecycle FSM: instantiates devices from
//! blueprints, drives each through the lifecycle FSM, runs the blueprint's
//! `lifecyclePlans` through the Transaction Coordinator on every transient
//! entry, applies restart policy on `Failed`, and cascades attach/start/
//! stop to `LINKED` children.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod instance;
mod restart;
mod supervisor;
mod timers;

pub use instance::{DeviceInstance, DeviceInstanceId, MAX_TRANSIENT_VISITS};
pub use restart::RestartSupervisor;
pub use supervisor::{DeviceSupervisor, SupervisorError};
pub use timers::{request_timer, TimerTickEvent};
