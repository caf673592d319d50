// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transaction Coordinator: Saga-style execution of a
//! `TransactionPlan` tree against any [`ActionSink`], with resource
//! locking, idempotency, retries, timeouts, and compensating rollback.
//!
//! This crate deliberately has no dependency on `dcc-hub`; the
//! [`ActionSink`] trait is the seam `dcc-hub` implements so that the hub
//! can both drive the coordinator (to run lifecycle plans) and be driven
//! by it (to dispatch plan leaves), without a dependency cycle.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod action_sink;
mod coordinator;
mod error;
mod idempotency;
mod locks;

pub use action_sink::ActionSink;
#[cfg(any(test, feature = "test-support"))]
pub use action_sink::fakes;
pub use coordinator::Coordinator;
pub use error::{RollbackReport, TransactionError, TransactionReport};
pub use idempotency::IdempotencyLedger;
pub use locks::{LockGuardSet, LockManager};
