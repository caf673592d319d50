// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StateValue<T>` and `Quality`.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// How trustworthy a `StateValue` is, worst-wins when combining two readings.
///
/// Ordering is significant: `ERROR` > `INVALID` > `STALE` > `OK`, so
/// combining two readings always yields the worse of the two qualities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Quality {
    Ok,
    Stale,
    Invalid,
    Error,
}

crate::simple_display! {
    Quality {
        Ok => "OK",
        Stale => "STALE",
        Invalid => "INVALID",
        Error => "ERROR",
    }
}

/// A value paired with when it was observed and how much to trust it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateValue<T> {
    pub value: T,
    pub timestamp: Instant,
    pub quality: Quality,
}

impl<T> StateValue<T> {
    pub fn new(value: T, timestamp: Instant, quality: Quality) -> Self {
        Self { value, timestamp, quality }
    }

    pub fn ok(value: T, timestamp: Instant) -> Self {
        Self::new(value, timestamp, Quality::Ok)
    }

    /// Combine two readings: the max timestamp and the worst quality win.
    ///
    /// The returned value is whichever side carries the later timestamp
    /// (ties keep `self`); combination is defined only over timestamp and
    /// quality, not value precedence.
    pub fn combine(self, other: Self) -> Self
    where
        T: Clone,
    {
        let quality = self.quality.max(other.quality);
        if other.timestamp > self.timestamp {
            Self { value: other.value, timestamp: other.timestamp, quality }
        } else {
            Self { value: self.value, timestamp: self.timestamp, quality }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StateValue<U> {
        StateValue { value: f(self.value), timestamp: self.timestamp, quality: self.quality }
    }
}

#[cfg(test)]
#[path = "state_value_tests.rs"]
mod tests;
