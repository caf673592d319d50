// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Peer routing: hub-to-hub links are opened through a
//! pluggable [`PeerDriver`]/[`PeerConnection`] pair, with the candidate
//! addresses for a link resolved by [`AddressResolver`] and picked per the
//! blueprint's [`FailoverStrategy`]. Dispatch-by-transport is kept open
//! ended so new peer transports register without touching this crate.

use crate::error::HubError;
use crate::wire::Envelope;
use dcc_core::{AddressSource, ExecutionContext, FailoverStrategy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Delivery guarantee requested for one [`PeerConnection::send`] call.
/// `AtMostOnce`/`AtLeastOnce` is the minimal vocabulary a send call needs
/// to express "fire and forget" vs. "retry until acknowledged" (see
/// DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
}

/// One live (or connecting) link to a peer hub, addressed by the physical
/// address an [`AddressResolver`] picked.
#[async_trait::async_trait]
pub trait PeerConnection: Send + Sync {
    async fn connect(&self) -> Result<(), HubError>;
    async fn disconnect(&self);

    /// A hot view of connection state.
    fn is_connected(&self) -> watch::Receiver<bool>;

    async fn send(&self, envelope: Envelope, qos: Qos, ctx: &ExecutionContext, timeout: Option<Duration>) -> Result<(), HubError>;

    async fn receive(&self, ctx: &ExecutionContext, timeout: Option<Duration>) -> Result<Option<Envelope>, HubError>;
}

/// A named transport, resolved from a blueprint's `peerConnections[name]`
/// entry by its `driverId`, that opens [`PeerConnection`]s to a physical
/// address.
#[async_trait::async_trait]
pub trait PeerDriver: Send + Sync {
    fn driver_id(&self) -> &str;

    async fn connect_to(&self, physical_address: &str) -> Result<Arc<dyn PeerConnection>, HubError>;
}

/// Resolves `AddressSource::Discovered` service ids to physical addresses.
/// Left pluggable since service discovery is an external concern with no
/// single required mechanism; `AddressSource::Static` needs no directory
/// and is resolved directly by [`AddressResolver`].
#[async_trait::async_trait]
pub trait ServiceDirectory: Send + Sync {
    async fn addresses_for(&self, service_id: &str) -> Result<Vec<String>, HubError>;
}

/// Turns a blueprint's [`AddressSource`] into an ordered list of candidate
/// physical addresses, then picks one per [`FailoverStrategy`].
pub struct AddressResolver {
    directory: Option<Arc<dyn ServiceDirectory>>,
    cursor: AtomicUsize,
}

impl AddressResolver {
    pub fn new(directory: Option<Arc<dyn ServiceDirectory>>) -> Self {
        Self { directory, cursor: AtomicUsize::new(0) }
    }

    pub async fn candidates(&self, source: &AddressSource) -> Result<Vec<String>, HubError> {
        match source {
            AddressSource::Static { addresses } => Ok(addresses.clone()),
            AddressSource::Discovered { service_id } => match &self.directory {
                Some(directory) => directory.addresses_for(service_id).await,
                None => Err(HubError::UnknownPeer(service_id.clone())),
            },
        }
    }

    /// Picks one of `candidates` per `failover`. `Random` draws from a
    /// counter run through a multiplicative hash rather than pulling in a
    /// random-number crate the rest of the stack has no other use for.
    pub fn select<'a>(&self, candidates: &'a [String], failover: FailoverStrategy) -> Option<&'a String> {
        if candidates.is_empty() {
            return None;
        }
        let index = match failover {
            FailoverStrategy::Ordered => 0,
            FailoverStrategy::RoundRobin => self.cursor.fetch_add(1, Ordering::Relaxed) % candidates.len(),
            FailoverStrategy::Random => {
                let draw = self.cursor.fetch_add(1, Ordering::Relaxed).wrapping_mul(2_654_435_761);
                draw % candidates.len()
            }
        };
        candidates.get(index)
    }
}

#[cfg(test)]
#[path = "peer_tests.rs"]
mod tests;
