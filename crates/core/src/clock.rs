// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.
//!
//! The lifecycle FSM's restart backoffs and the runtime's named timers need
//! deterministic time under test; every timing-sensitive component is written against this
//! trait instead of calling `Instant::now()` directly.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
    epoch_ms: Arc<Mutex<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { current: Arc::new(Mutex::new(Instant::now())), epoch_ms: Arc::new(Mutex::new(1_000_000)) }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        *self.current.lock() += duration;
        *self.epoch_ms.lock() += duration.as_millis() as u64;
    }

    /// Set the epoch milliseconds value.
    pub fn set_epoch_ms(&self, ms: u64) {
        *self.epoch_ms.lock() = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }

    fn epoch_ms(&self) -> u64 {
        *self.epoch_ms.lock()
    }
}

/// Object-safe counterpart of [`Clock`] (which requires `Clone`, so it
/// can't be made into a trait object directly). [`DynClock`] lets
/// long-lived components store "a clock" as a field without becoming
/// generic over the concrete clock type.
pub trait ClockObject: Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;
}

impl<C: Clock> ClockObject for C {
    fn now(&self) -> Instant {
        Clock::now(self)
    }

    fn epoch_ms(&self) -> u64 {
        Clock::epoch_ms(self)
    }
}

/// Type-erased, cheaply cloneable handle to any [`Clock`] implementation.
#[derive(Clone)]
pub struct DynClock(Arc<dyn ClockObject>);

impl DynClock {
    pub fn new(clock: impl Clock) -> Self {
        Self(Arc::new(clock))
    }
}

impl Clock for DynClock {
    fn now(&self) -> Instant {
        self.0.now()
    }

    fn epoch_ms(&self) -> u64 {
        self.0.epoch_ms()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
