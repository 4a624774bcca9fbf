//! Simulated reading source for demos without the vehicle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::counter;
use pothole_core::RawReading;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::{info, warn};

use crate::mode::ModeHandle;
use crate::pipeline::IngestionPipeline;

/// Severities drawn uniformly; mostly smooth road with occasional hits.
const SEVERITY_CHOICES: [u64; 8] = [0, 0, 0, 1, 0, 2, 0, 3];

/// Configuration for the demo source.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Delay between simulated readings while in demo mode.
    /// Default: 500 ms
    pub interval: Duration,

    /// How often to re-check the mode while not in demo mode.
    /// Default: 200 ms
    pub idle_poll: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            idle_poll: Duration::from_millis(200),
        }
    }
}

/// Statistics from a demo source run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoStats {
    /// Readings accepted by the pipeline.
    pub submitted: usize,
    /// Readings the pipeline rejected.
    pub failed: usize,
}

/// Produces simulated readings while the mode is `"demo"`.
pub struct DemoSource {
    config: DemoConfig,
    pipeline: IngestionPipeline,
    mode: ModeHandle,
    running: Arc<AtomicBool>,
    rng: StdRng,
}

impl DemoSource {
    pub fn new(config: DemoConfig, pipeline: IngestionPipeline, mode: ModeHandle) -> Self {
        Self {
            config,
            pipeline,
            mode,
            running: Arc::new(AtomicBool::new(true)),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Use a fixed seed so the simulated sequence is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Flag that keeps [`run`](Self::run) going; store `false` to stop it.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Run until the running flag is cleared.
    pub async fn run(mut self) -> DemoStats {
        let mut stats = DemoStats::default();
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            "demo source started"
        );

        while self.running.load(Ordering::SeqCst) {
            if !self.mode.is_demo() {
                tokio::time::sleep(self.config.idle_poll).await;
                continue;
            }

            let raw = simulated_reading(&mut self.rng);
            match self.pipeline.ingest(&raw).await {
                Ok(_) => {
                    stats.submitted += 1;
                    counter!("demo_readings_total").increment(1);
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(error = %e, "demo reading rejected");
                }
            }

            tokio::time::sleep(self.config.interval).await;
        }

        info!(
            submitted = stats.submitted,
            failed = stats.failed,
            "demo source stopped"
        );
        stats
    }
}

/// One simulated submission, shaped like the vehicle's own posts.
pub fn simulated_reading<R: Rng>(rng: &mut R) -> RawReading {
    let severity = SEVERITY_CHOICES[rng.random_range(0..SEVERITY_CHOICES.len())];

    RawReading::from_value(json!({
        "distance": rng.random_range(15.0..30.0),
        "speed": rng.random_range(120..=170),
        "severity": severity,
        "roadScore": rng.random_range(60..=100),
    }))
}
