use crate::record::LogRecord;

/// Pending records in delivery order.
///
/// Reading a prefix for a payload and discarding it are separate steps so
/// that records appended while a delivery is in flight are never lost:
/// only the prefix that was actually delivered gets removed.
#[derive(Debug, Default)]
pub struct LogBuffer {
    records: Vec<LogRecord>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: LogRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read-only view of the first `n` records (fewer if the buffer is
    /// shorter).
    pub fn drain_prefix(&self, n: usize) -> &[LogRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Discard the first `n` records. Call only after `n` records were
    /// delivered successfully.
    pub fn remove_prefix(&mut self, n: usize) {
        let n = n.min(self.records.len());
        self.records.drain(..n);
    }
}
