//! Reading producers that run inside the process.
//!
//! Readings from the vehicle arrive over HTTP; producers here are
//! in-process alternatives. Every producer submits through
//! [`IngestionPipeline::ingest`](crate::IngestionPipeline::ingest), exactly
//! like an external submitter, so the pipeline stays agnostic to where
//! readings originate.
//!
//! - [`DemoSource`] - simulated readings while the mode is `"demo"`

mod demo;

pub use demo::{DemoConfig, DemoSource, DemoStats};
