//! SQLite-backed reading log.

use std::path::Path;

use parking_lot::Mutex;
use pothole_core::{RecordId, StampedReading, StoredReading};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

use super::ReadingStore;
use super::schema::init_schema;
use crate::Result;

/// Durable reading log in a single SQLite database.
///
/// Writes go through one connection behind a mutex; each append is a single
/// `INSERT`, so it is atomic, and `synchronous=FULL` makes it durable once
/// the call returns.
pub struct SqliteReadingStore {
    conn: Mutex<Connection>,
}

impl SqliteReadingStore {
    /// Open or create a reading log at the given path.
    ///
    /// Missing parent directories are created.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pothole_ingest::SqliteReadingStore;
    ///
    /// let store = SqliteReadingStore::open("./data/readings.db")?;
    /// # Ok::<(), pothole_ingest::Error>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening reading log at {}", path.display());
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database (nothing survives the process).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        init_schema(&conn)?;

        let stored: i64 = conn.query_row("SELECT COUNT(*) FROM road_data", [], |row| row.get(0))?;
        info!(journal_mode = %journal_mode, readings = stored, "reading log ready");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Id of the most recent record, if any.
    pub fn last_id(&self) -> Result<Option<RecordId>> {
        let conn = self.conn.lock();
        let id = conn
            .query_row("SELECT MAX(id) FROM road_data", [], |row| {
                row.get::<_, Option<i64>>(0)
            })
            .optional()?
            .flatten();
        Ok(id)
    }
}

impl ReadingStore for SqliteReadingStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn append(&self, reading: &StampedReading) -> Result<RecordId> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO road_data
                (distance, speed, severity, road_score, potholes, pothole_event, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                reading.distance,
                reading.speed,
                to_sql_int(reading.severity),
                reading.road_score,
                to_sql_int(reading.pothole_count),
                reading.pothole_event,
                reading.timestamp,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn read_since(&self, cursor: RecordId, limit: Option<usize>) -> Result<Vec<StoredReading>> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, distance, speed, severity, road_score, potholes, pothole_event, timestamp
             FROM road_data
             WHERE id > ?1
             ORDER BY id ASC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], stored_from_row)?;
        let readings = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(readings)
    }
}

fn stored_from_row(row: &Row<'_>) -> rusqlite::Result<StoredReading> {
    Ok(StoredReading {
        id: row.get(0)?,
        reading: StampedReading {
            distance: row.get(1)?,
            speed: row.get(2)?,
            severity: from_sql_int(row.get(3)?),
            road_score: row.get(4)?,
            pothole_count: from_sql_int(row.get(5)?),
            pothole_event: row.get(6)?,
            timestamp: row.get(7)?,
        },
    })
}

/// SQLite integers are signed; saturate rather than wrap.
fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_sql_int(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
