// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The audit log: `record(message)` plus a `query` returning
//! a lazy stream of historical messages, kept as a trait for the same
//! reason as [`SnapshotStore`](crate::snapshot_store::SnapshotStore) — the
//! backing store is an external concern.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded wire event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub payload_type: String,
    /// ISO-8601 with millisecond precision, so records sort lexicographically in chronological order.
    pub time: String,
    pub source_device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub payload: Value,
}

/// Matches a subset of recorded events; `None` fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditFilter {
    pub source_device: Option<String>,
    pub payload_type: Option<String>,
}

impl AuditFilter {
    fn matches(&self, record: &AuditRecord) -> bool {
        self.source_device.as_deref().map(|d| d == record.source_device).unwrap_or(true)
            && self.payload_type.as_deref().map(|t| t == record.payload_type).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditLogQuery {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub filter: Option<AuditFilter>,
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, record: AuditRecord);

    async fn query(&self, query: AuditLogQuery) -> BoxStream<'static, AuditRecord>;
}

/// An in-process, append-only [`AuditLog`] backed by an in-memory vector.
#[derive(Default)]
pub struct InMemoryAuditLog {
    records: parking_lot::RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, record: AuditRecord) {
        self.records.write().push(record);
    }

    async fn query(&self, query: AuditLogQuery) -> BoxStream<'static, AuditRecord> {
        let matches: Vec<AuditRecord> = self
            .records
            .read()
            .iter()
            .filter(|record| {
                query.start_time.as_deref().map(|start| record.time.as_str() >= start).unwrap_or(true)
                    && query.end_time.as_deref().map(|end| record.time.as_str() <= end).unwrap_or(true)
                    && query.filter.as_ref().map(|filter| filter.matches(record)).unwrap_or(true)
            })
            .cloned()
            .collect();
        Box::pin(stream::iter(matches)) as BoxStream<'static, AuditRecord>
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
