//! Core pipeline components for reading ingestion.
//!
//! - [`IngestionPipeline`] - coerces, detects, stamps and commits readings
//! - [`Broadcaster`] - fans committed readings out to live subscribers
//!
//! # Architecture
//!
//! ```text
//! [HTTP submitter] ─┐
//!                   ├─► [IngestionPipeline] ─► [ReadingStore] ─► [Broadcaster] ─► clients
//! [DemoSource] ─────┘      (detector)          (durable)        (ephemeral)
//! ```
//!
//! A reading is published only after it has been stored.

mod broadcast;
mod ingest;

pub use broadcast::{
    Broadcaster, DEFAULT_SUBSCRIBER_BUFFER, PublishReport, Subscription, SubscriptionId,
};
pub use ingest::IngestionPipeline;
