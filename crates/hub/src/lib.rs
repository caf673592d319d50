// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Hub & Message Router: `DeviceHub` is the public
//! surface clients call (`readProperty`/`writeProperty`/`execute`/
//! `subscribe`/`publish`) and the [`ActionSink`](dcc_transaction::ActionSink)
//! the Transaction Coordinator drives plan leaves through. Owns the
//! blueprint registry lookups, the per-device lifecycle supervisors, the
//! stateful property stores, the broker devices publish through, the
//! action-result cache, and the peer table used to forward operations on
//! non-local addresses.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod action_handler;
mod audit;
mod broker;
mod cache;
mod config;
mod error;
mod hub;
mod peer;
mod snapshot_store;
mod topic;
mod wire;

pub use action_handler::{ActionHandler, EchoActionHandler};
pub use audit::{AuditFilter, AuditLog, AuditLogQuery, AuditRecord, InMemoryAuditLog};
pub use broker::{BrokerEvent, MessageBroker, Subscription};
pub use cache::ActionCache;
pub use config::{HubConfig, ListenConfig, PeerConfig};
pub use error::HubError;
pub use hub::DeviceHub;
pub use peer::{AddressResolver, PeerConnection, PeerDriver, Qos, ServiceDirectory};
pub use snapshot_store::{InMemorySnapshotStore, SnapshotStore};
pub use wire::{read_message, write_message, Envelope, WireError, MAX_FRAME_BYTES};
