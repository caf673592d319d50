// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The message broker: publish/subscribe over topics,
//! with key/headers metadata for partitioning and tracing-context
//! propagation. Backed by `tokio::sync::broadcast` as a hot-broadcast
//! channel.

use crate::topic;
use serde_json::Value;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

/// One message flowing through the broker: a publish to a topic, plus the
/// partitioning/tracing metadata clients use for correlation.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerEvent {
    pub topic: String,
    pub payload: Value,
    pub key: Option<String>,
    pub headers: std::collections::HashMap<String, String>,
}

/// Broadcasts every published event to every live subscription; each
/// subscription filters by its own topic pattern rather than the broker pre-filtering per subscriber, keeping
/// the hot path a single `broadcast::Sender::send`.
pub struct MessageBroker {
    tx: broadcast::Sender<BrokerEvent>,
}

impl Default for MessageBroker {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl MessageBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, topic: impl Into<String>, payload: Value, key: Option<String>, headers: std::collections::HashMap<String, String>) {
        let event = BrokerEvent { topic: topic.into(), payload, key, headers };
        // No live subscribers is not an error; the event is simply dropped.
        let _ = self.tx.send(event);
    }

    /// A hot stream of every event whose topic matches `pattern` -> HotStream<BrokerEvent>`).
    pub fn subscribe(&self, pattern: impl Into<String>) -> Subscription {
        Subscription { pattern: pattern.into(), rx: self.tx.subscribe() }
    }
}

pub struct Subscription {
    pattern: String,
    rx: broadcast::Receiver<BrokerEvent>,
}

impl Subscription {
    /// Await the next event matching this subscription's pattern, skipping
    /// non-matching events and tolerating lagged-receiver gaps.
    pub async fn recv(&mut self) -> Option<BrokerEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if topic::matches(&self.pattern, &event.topic) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
