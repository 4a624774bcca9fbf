//! Append-only reading log.
//!
//! The pipeline depends only on the [`ReadingStore`] trait:
//!
//! - [`SqliteReadingStore`] - durable log in a SQLite file (WAL, synchronous=FULL)
//! - [`MemoryReadingStore`] - process-local log for tests and throwaway runs
//!
//! # Contract
//!
//! - `append` is durable before it returns and is all-or-nothing: readers
//!   never observe a partially written record.
//! - Record ids are strictly increasing in append order, so any id is a
//!   valid cursor and cursor `0` precedes every record.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryReadingStore;
pub use sqlite::SqliteReadingStore;

use pothole_core::{RecordId, StampedReading, StoredReading};

use crate::Result;

/// Durable, append-only log of stamped readings.
///
/// Implementations are shared between the committer task and HTTP
/// handlers, so they must be usable through `&self` from many threads.
/// Calls may block on I/O; async callers run them on the blocking pool.
pub trait ReadingStore: Send + Sync {
    /// Human-readable backend name (used in logs).
    fn name(&self) -> &'static str;

    /// Append a reading and return its record id.
    fn append(&self, reading: &StampedReading) -> Result<RecordId>;

    /// Records with id greater than `cursor`, in ascending id order.
    ///
    /// At most `limit` records are returned when a limit is given.
    fn read_since(&self, cursor: RecordId, limit: Option<usize>) -> Result<Vec<StoredReading>>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every [`ReadingStore`] must share.

    use super::*;
    use pothole_core::SensorSample;

    pub fn reading(severity: u64, count: u64, timestamp: i64) -> StampedReading {
        SensorSample {
            distance: 21.0,
            speed: 140.0,
            severity,
            road_score: 88.5,
        }
        .stamp(severity > 0, count, timestamp)
    }

    pub fn append_assigns_increasing_ids(store: &dyn ReadingStore) {
        let a = store.append(&reading(0, 0, 10)).unwrap();
        let b = store.append(&reading(1, 1, 11)).unwrap();
        let c = store.append(&reading(1, 1, 12)).unwrap();
        assert!(a > 0);
        assert!(a < b && b < c);
    }

    pub fn read_since_respects_cursor_and_limit(store: &dyn ReadingStore) {
        let ids: Vec<RecordId> = (0..5)
            .map(|i| store.append(&reading(i % 2, i, 100 + i as i64)).unwrap())
            .collect();

        let all = store.read_since(0, None).unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
        assert_eq!(all[3].reading, reading(1, 3, 103));

        let tail = store.read_since(ids[1], None).unwrap();
        assert_eq!(tail.iter().map(|r| r.id).collect::<Vec<_>>(), &ids[2..]);

        let page = store.read_since(ids[0], Some(2)).unwrap();
        assert_eq!(page.iter().map(|r| r.id).collect::<Vec<_>>(), &ids[1..3]);

        assert!(store.read_since(ids[4], None).unwrap().is_empty());
        assert!(store.read_since(0, Some(0)).unwrap().is_empty());
    }

    pub fn empty_store_reads_nothing(store: &dyn ReadingStore) {
        assert!(store.read_since(0, None).unwrap().is_empty());
    }
}
