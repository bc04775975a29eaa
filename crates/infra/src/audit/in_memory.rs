use std::sync::RwLock;

use koperasi_core::{ItemCode, TransformationId};
use koperasi_inventory::TransformationRecord;

use super::{AuditError, AuditSink};

/// Append-only in-memory audit log.
///
/// Intended for tests/dev. Entries are kept in commit order.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<TransformationRecord>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TransformationRecord> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn get(&self, id: TransformationId) -> Option<TransformationRecord> {
        let entries = self.entries.read().ok()?;
        entries.iter().find(|r| r.id == id).cloned()
    }

    /// Every record where `code` was the source or the target.
    pub fn for_item(&self, code: &ItemCode) -> Vec<TransformationRecord> {
        match self.entries.read() {
            Ok(entries) => entries.iter().filter(|r| r.involves(code)).cloned().collect(),
            Err(_) => vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditLog {
    fn record(&self, record: &TransformationRecord) -> Result<(), AuditError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuditError::Unavailable("lock poisoned".to_string()))?;
        entries.push(record.clone());
        Ok(())
    }
}
