//! Audit sinks for committed transformations.
//!
//! Recording is best-effort from the engine's point of view: a failing sink is
//! logged and never rolls back a committed stock change.

pub mod in_memory;
pub mod json_lines;

pub use in_memory::InMemoryAuditLog;
pub use json_lines::{JsonLinesAuditLog, read_records};

use std::sync::Arc;

use thiserror::Error;

use koperasi_inventory::TransformationRecord;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log unavailable: {0}")]
    Unavailable(String),

    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write audit record: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable destination for [`TransformationRecord`]s.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &TransformationRecord) -> Result<(), AuditError>;
}

impl<A> AuditSink for Arc<A>
where
    A: AuditSink + ?Sized,
{
    fn record(&self, record: &TransformationRecord) -> Result<(), AuditError> {
        (**self).record(record)
    }
}
