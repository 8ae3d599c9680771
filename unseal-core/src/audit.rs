use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};

/// What happened to one decrypt request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    BadRequest,
    Unauthorized,
    Started,
    Succeeded,
    Failed,
}

impl AuditKind {
    /// Stable action label for log pipelines.
    pub fn action(&self) -> &'static str {
        match self {
            AuditKind::BadRequest => "decrypt.bad_request",
            AuditKind::Unauthorized => "decrypt.unauthorized",
            AuditKind::Started => "decrypt.started",
            AuditKind::Succeeded => "decrypt.succeeded",
            AuditKind::Failed => "decrypt.failed",
        }
    }

    /// Rejected input and failed attempts are trail entries at warning
    /// severity; the rest of the lifecycle is informational.
    pub fn is_warning(&self) -> bool {
        matches!(self, AuditKind::BadRequest | AuditKind::Failed)
    }
}

/// One append-only trail entry.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub kind: AuditKind,
    pub source: Option<SocketAddr>,
    pub identity: Option<String>,
    pub detail: String,
    pub at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(kind: AuditKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            source: None,
            identity: None,
            detail: detail.into(),
            at: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: Option<SocketAddr>) -> Self {
        self.source = source;
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn source_label(&self) -> String {
        self.source
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".into())
    }
}

/// Destination for the decision trail.
///
/// Recording must never fail the request it describes; sinks with fallible
/// transports swallow the error and report it through diagnostics.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

impl<T> AuditSink for Arc<T>
where
    T: AuditSink + ?Sized,
{
    fn record(&self, record: AuditRecord) {
        (**self).record(record)
    }
}

impl<T> AuditSink for Box<T>
where
    T: AuditSink + ?Sized,
{
    fn record(&self, record: AuditRecord) {
        (**self).record(record)
    }
}

/// Writes the trail through the `tracing` pipeline, tagged with an `audit`
/// field so collectors can split it from diagnostic output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        let source = record.source_label();
        let identity = record.identity.as_deref().unwrap_or("(none)");
        if record.kind.is_warning() {
            warn!(
                target = "audit",
                action = record.kind.action(),
                source = %source,
                identity = %identity,
                detail = %record.detail,
                "decrypt audit event"
            );
        } else {
            info!(
                target = "audit",
                action = record.kind.action(),
                source = %source,
                identity = %identity,
                detail = %record.detail,
                "decrypt audit event"
            );
        }
    }
}

/// In-memory sink for tests and embedded callers.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    pub fn kinds(&self) -> Vec<AuditKind> {
        self.records.lock().iter().map(|record| record.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        self.records.lock().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_preserves_arrival_order() {
        let sink = MemoryAuditSink::new();
        sink.record(AuditRecord::new(AuditKind::Started, "started"));
        sink.record(AuditRecord::new(AuditKind::Succeeded, "succeeded"));

        assert_eq!(sink.kinds(), vec![AuditKind::Started, AuditKind::Succeeded]);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn rejections_and_failures_carry_warning_severity() {
        assert!(AuditKind::BadRequest.is_warning());
        assert!(AuditKind::Failed.is_warning());
        assert!(!AuditKind::Unauthorized.is_warning());
        assert!(!AuditKind::Started.is_warning());
        assert!(!AuditKind::Succeeded.is_warning());
    }

    #[test]
    fn record_builder_fills_source_and_identity() {
        let addr: SocketAddr = "10.0.0.9:4455".parse().unwrap();
        let record = AuditRecord::new(AuditKind::Failed, "no such entry")
            .with_source(Some(addr))
            .with_identity("system:serviceaccount:ns:app");

        assert_eq!(record.source_label(), "10.0.0.9:4455");
        assert_eq!(
            record.identity.as_deref(),
            Some("system:serviceaccount:ns:app")
        );
        assert_eq!(
            AuditRecord::new(AuditKind::Started, "").source_label(),
            "unknown"
        );
    }
}
