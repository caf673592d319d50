// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Addressing: `Address` is the sole routing identity for a device.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the hub that owns a device, possibly multiple hops away.
///
/// A route is a `.`-separated chain of hub ids, e.g. `"site-a.rack-3"`.
/// The empty route refers to the local hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(pub String);

impl Route {
    /// The local hub (no hop required).
    pub fn local() -> Self {
        Self(String::new())
    }

    pub fn is_local(&self) -> bool {
        self.0.is_empty()
    }

    /// First hop on this route, and the remaining route after it.
    ///
    /// Returns `None` when the route is local.
    pub fn next_hop(&self) -> Option<(&str, Route)> {
        if self.0.is_empty() {
            return None;
        }
        match self.0.split_once('.') {
            Some((hub, rest)) => Some((hub, Route(rest.to_string()))),
            None => Some((self.0.as_str(), Route::local())),
        }
    }
}

impl From<&str> for Route {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hierarchical local name of a device inside its owning hub, e.g.
/// `"boiler.pump-1"` for a child `pump-1` nested under `boiler`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceName(pub String);

impl DeviceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Append a child's local name to form the child's full hierarchical name.
    pub fn child(&self, local_name: &str) -> Self {
        Self(format!("{}.{local_name}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The local name segment of this device (last `.`-separated token).
    pub fn local_segment(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// The parent's full name, if this is a nested device.
    pub fn parent(&self) -> Option<DeviceName> {
        self.0.rsplit_once('.').map(|(parent, _)| DeviceName(parent.to_string()))
    }
}

impl From<&str> for DeviceName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `(route, device)` pair naming a device anywhere in the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub route: Route,
    pub device: DeviceName,
}

impl Address {
    pub fn local(device: impl Into<DeviceName>) -> Self {
        Self { route: Route::local(), device: device.into() }
    }

    pub fn remote(route: impl Into<Route>, device: impl Into<DeviceName>) -> Self {
        Self { route: route.into(), device: device.into() }
    }

    pub fn is_local(&self) -> bool {
        self.route.is_local()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.route.is_local() {
            write!(f, "{}", self.device)
        } else {
            write!(f, "{}:{}", self.route, self.device)
        }
    }
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
