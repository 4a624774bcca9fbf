//! Pothole telemetry ingestion pipeline components.
//!
//! # Modules
//!
//! - [`pipeline`] - Ingestion pipeline and live broadcaster
//! - [`store`] - Append-only reading log (SQLite, in-memory)
//! - [`source`] - In-process reading producers (demo simulation)
//! - [`mode`] - Shared data-origin mode setting
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   Reading sources    │  (HTTP submissions, demo simulation)
//! └──────────┬───────────┘
//!            │ ingest()
//!            ▼
//! ┌──────────────────────┐
//! │  IngestionPipeline   │  coerce → detect → stamp (serialized)
//! └──────────┬───────────┘
//!            │ commit queue
//!            ▼
//! ┌──────────────────────┐
//! │    ReadingStore      │  durable append-only log
//! └──────────┬───────────┘
//!            │ after a successful append
//!            ▼
//! ┌──────────────────────┐
//! │     Broadcaster      │  non-blocking fan-out to live subscribers
//! └──────────────────────┘
//! ```
//!
//! The store is the source of truth; the broadcaster is ephemeral and never
//! replays history.
//!
//! All state lives in one process. Running several processes against one
//! store would need the detector and subscriber registry moved into a
//! shared coordinator, which this crate does not provide.

pub mod error;
pub mod mode;
pub mod pipeline;
pub mod source;
pub mod store;

pub use error::{Error, Result};

pub use mode::ModeHandle;

pub use pipeline::{
    Broadcaster, DEFAULT_SUBSCRIBER_BUFFER, IngestionPipeline, PublishReport, Subscription,
    SubscriptionId,
};

pub use source::{DemoConfig, DemoSource, DemoStats};

pub use store::{MemoryReadingStore, ReadingStore, SqliteReadingStore};
