//! Reading ingestion: coerce, detect, stamp, persist, publish.
//!
//! # Ordering
//!
//! Detection, timestamping and the hand-off to the commit queue happen in
//! one short critical section under a mutex. Nothing in it blocks. A single
//! committer task then appends each reading to the store and publishes it,
//! in queue order. Readings therefore reach the store and every subscriber
//! in the order they were stamped, while the detector lock is never held
//! across storage I/O.
//!
//! ```text
//! ingest() ──┬─► [Mutex: detect + stamp + enqueue] ──► commit queue
//! ingest() ──┘                                             │
//!                                     committer task ◄─────┘
//!                                       append (blocking pool)
//!                                       publish (non-blocking)
//!                                       reply to submitter
//! ```
//!
//! A submitter that goes away after enqueueing does not stop its reading
//! from being stored and published.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use parking_lot::Mutex;
use pothole_core::{
    DetectorState, EventDetector, FallbackCause, RawReading, StampedReading, StoredReading,
    now_millis,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::broadcast::Broadcaster;
use crate::store::ReadingStore;
use crate::{Error, Result};

struct Commit {
    reading: StampedReading,
    reply: oneshot::Sender<Result<StoredReading>>,
}

/// State mutated once per reading; the single point of mutual exclusion.
struct Sequencer {
    detector: EventDetector,
    last_timestamp: i64,
    commits: mpsc::UnboundedSender<Commit>,
}

/// Entry point for every reading, whatever its origin.
///
/// Cheap to clone; clones share the detector and the committer.
#[derive(Clone)]
pub struct IngestionPipeline {
    sequencer: Arc<Mutex<Sequencer>>,
    clock: fn() -> i64,
}

impl IngestionPipeline {
    /// Create a pipeline and spawn its committer task.
    ///
    /// The committer runs until every clone of the pipeline has been
    /// dropped and the queue is drained; await the returned handle to wait
    /// for that during shutdown.
    pub fn start(
        store: Arc<dyn ReadingStore>,
        broadcaster: Broadcaster,
    ) -> (Self, JoinHandle<()>) {
        Self::start_with_clock(store, broadcaster, now_millis)
    }

    fn start_with_clock(
        store: Arc<dyn ReadingStore>,
        broadcaster: Broadcaster,
        clock: fn() -> i64,
    ) -> (Self, JoinHandle<()>) {
        let (commits, queue) = mpsc::unbounded_channel();

        info!(store = store.name(), "starting ingestion pipeline");
        let handle = tokio::spawn(run_committer(queue, store, broadcaster));

        let pipeline = Self {
            sequencer: Arc::new(Mutex::new(Sequencer {
                detector: EventDetector::new(),
                last_timestamp: i64::MIN,
                commits,
            })),
            clock,
        };

        (pipeline, handle)
    }

    /// Ingest one raw submission.
    ///
    /// Garbled or missing fields default to zero. Resolves once the reading
    /// is durably stored and handed to the broadcaster. Fails only if the
    /// store rejects the append or the committer has stopped; detector
    /// state is not rolled back in either case.
    pub async fn ingest(&self, raw: &RawReading) -> Result<StoredReading> {
        let normalized = raw.normalize();
        for fallback in &normalized.fallbacks {
            match &fallback.cause {
                FallbackCause::Missing => {
                    debug!(field = fallback.field, "field missing, defaulting to zero");
                }
                FallbackCause::Invalid(reason) => {
                    debug!(field = fallback.field, %reason, "field invalid, defaulting to zero");
                    counter!("ingest_readings_defaulted_total", "field" => fallback.field)
                        .increment(1);
                }
            }
        }

        let sample = normalized.sample;
        let (reply, response) = oneshot::channel();

        let reading = {
            let mut seq = self.sequencer.lock();
            let detection = seq.detector.process(sample.severity);
            let timestamp = (self.clock)().max(seq.last_timestamp);
            seq.last_timestamp = timestamp;

            let reading = sample.stamp(detection.pothole_event, detection.pothole_count, timestamp);
            seq.commits
                .send(Commit { reading, reply })
                .map_err(|_| Error::PipelineClosed)?;
            gauge!("detector_pothole_count").set(reading.pothole_count as f64);
            reading
        };

        if reading.pothole_event {
            counter!("detector_pothole_events_total").increment(1);
            info!(
                severity = reading.severity,
                potholes = reading.pothole_count,
                "pothole event detected"
            );
        }

        response.await.map_err(|_| Error::PipelineClosed)?
    }

    /// Snapshot of the detector state.
    pub fn detector_state(&self) -> DetectorState {
        self.sequencer.lock().detector.state()
    }
}

async fn run_committer(
    mut queue: mpsc::UnboundedReceiver<Commit>,
    store: Arc<dyn ReadingStore>,
    broadcaster: Broadcaster,
) {
    while let Some(Commit { reading, reply }) = queue.recv().await {
        let started = Instant::now();
        let append_store = Arc::clone(&store);
        let appended = tokio::task::spawn_blocking(move || append_store.append(&reading))
            .await
            .map_err(|e| Error::Storage(format!("append task failed: {e}")))
            .and_then(|result| result);
        histogram!("ingest_commit_duration_seconds").record(started.elapsed().as_secs_f64());

        let outcome = match appended {
            Ok(id) => {
                let report = broadcaster.publish(&reading);
                counter!("ingest_readings_total").increment(1);
                debug!(
                    id,
                    severity = reading.severity,
                    potholes = reading.pothole_count,
                    delivered = report.delivered,
                    "reading committed"
                );
                Ok(StoredReading { id, reading })
            }
            Err(e) => {
                // Not published: subscribers only see durably recorded readings.
                counter!("ingest_storage_failures_total").increment(1);
                error!(error = %e, timestamp = reading.timestamp, "failed to store reading");
                Err(e)
            }
        };

        // The submitter may have disconnected; the reading is committed regardless.
        let _ = reply.send(outcome);
    }

    info!("ingestion committer stopped");
}
