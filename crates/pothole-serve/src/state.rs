//! Shared application state.

use std::sync::Arc;

use pothole_ingest::{
    Broadcaster, IngestionPipeline, MemoryReadingStore, ModeHandle, ReadingStore,
    SqliteReadingStore,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Entry point for submitted readings.
    pub pipeline: IngestionPipeline,

    /// Live fan-out to connected dashboards.
    pub broadcaster: Broadcaster,

    /// Durable reading log, used for cursor catch-up.
    pub store: Arc<dyn ReadingStore>,

    /// Current data-origin mode.
    pub mode: ModeHandle,

    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Wire up the pipeline around `store` and spawn its committer.
    ///
    /// The returned handle completes once every clone of the state (and
    /// any other pipeline clone) is dropped and pending readings are
    /// committed.
    pub fn start(store: Arc<dyn ReadingStore>, config: &Config) -> (Self, JoinHandle<()>) {
        let broadcaster = Broadcaster::new(config.subscriber_buffer);
        let (pipeline, committer) =
            IngestionPipeline::start(Arc::clone(&store), broadcaster.clone());
        let (shutdown, _) = watch::channel(false);

        let state = Self {
            pipeline,
            broadcaster,
            store,
            mode: ModeHandle::new(config.default_mode.clone()),
            shutdown: Arc::new(shutdown),
        };

        (state, committer)
    }

    /// Tell long-lived responses (live streams) to finish.
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once [`begin_shutdown`](Self::begin_shutdown) has been called.
    pub fn shutdown_signal(&self) -> impl Future<Output = ()> + Send + 'static + use<> {
        let mut rx = self.shutdown.subscribe();
        async move {
            let _ = rx.wait_for(|stopping| *stopping).await;
        }
    }
}

/// Open the reading store named by the configuration.
pub fn open_store(config: &Config) -> anyhow::Result<Arc<dyn ReadingStore>> {
    if config.uses_memory_store() {
        tracing::warn!("using in-memory reading store; readings will not survive a restart");
        return Ok(Arc::new(MemoryReadingStore::new()));
    }

    let store = SqliteReadingStore::open(&config.db_path)?;
    tracing::info!(
        path = %config.db_path.display(),
        last_id = ?store.last_id()?,
        "reading store opened"
    );
    Ok(Arc::new(store))
}
