//! In-memory reading log.

use parking_lot::RwLock;
use pothole_core::{RecordId, StampedReading, StoredReading};

use super::ReadingStore;
use crate::Result;

/// Reading log held in process memory.
///
/// Follows the same contract as the durable backends except that nothing
/// survives a restart. Record `n` (1-based) lives at index `n - 1`.
#[derive(Default)]
pub struct MemoryReadingStore {
    records: RwLock<Vec<StampedReading>>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored readings.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReadingStore for MemoryReadingStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn append(&self, reading: &StampedReading) -> Result<RecordId> {
        let mut records = self.records.write();
        records.push(*reading);
        Ok(records.len() as RecordId)
    }

    fn read_since(&self, cursor: RecordId, limit: Option<usize>) -> Result<Vec<StoredReading>> {
        let records = self.records.read();
        let start = usize::try_from(cursor.max(0)).unwrap_or(usize::MAX).min(records.len());

        let readings = records[start..]
            .iter()
            .enumerate()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(offset, reading)| StoredReading {
                id: (start + offset + 1) as RecordId,
                reading: *reading,
            })
            .collect();

        Ok(readings)
    }
}
