//! Core types, event detection, and shared utilities for the pothole
//! telemetry pipeline.
//!
//! This crate provides:
//! - The reading data model and lenient coercion of raw submissions
//! - The edge-triggered pothole [`EventDetector`]
//! - Prometheus metrics helpers
//! - Shared error types

pub mod detector;
mod error;
pub mod metrics;
pub mod reading;

/// Mode in effect when none has been set.
pub const DEFAULT_MODE: &str = "hardware";

/// Mode that enables the simulated reading source.
pub const DEMO_MODE: &str = "demo";

pub use detector::{Detection, DetectorState, EventDetector};
pub use error::{Error, Result};
pub use reading::{
    Fallback, FallbackCause, MAX_SEVERITY, Normalized, RawReading, RecordId, SensorSample,
    StampedReading, StoredReading,
};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
