use std::io::{BufRead, Write};
use std::sync::Mutex;

use koperasi_inventory::TransformationRecord;

use super::{AuditError, AuditSink};

/// Audit sink writing one JSON document per line to any writer
/// (a log file, a pipe, an in-memory buffer).
#[derive(Debug)]
pub struct JsonLinesAuditLog<W> {
    writer: Mutex<W>,
}

impl<W: Write> JsonLinesAuditLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, AuditError> {
        self.writer
            .into_inner()
            .map_err(|_| AuditError::Unavailable("lock poisoned".to_string()))
    }
}

impl<W: Write + Send> AuditSink for JsonLinesAuditLog<W> {
    fn record(&self, record: &TransformationRecord) -> Result<(), AuditError> {
        let line = serde_json::to_vec(record)?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AuditError::Unavailable("lock poisoned".to_string()))?;
        writer.write_all(&line)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Read back records written by [`JsonLinesAuditLog`]. Blank lines are skipped.
pub fn read_records(reader: impl BufRead) -> Result<Vec<TransformationRecord>, AuditError> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}
