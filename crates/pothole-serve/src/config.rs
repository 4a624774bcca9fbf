//! Service configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::anyhow;
use pothole_core::DEFAULT_MODE;
use pothole_ingest::DEFAULT_SUBSCRIBER_BUFFER;

/// `POTHOLE_DB_PATH` value that selects the in-memory store.
pub const MEMORY_DB_PATH: &str = ":memory:";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_DB_PATH: &str = "./data/readings.db";
const DEFAULT_DEMO_INTERVAL_MS: u64 = 500;
const DEFAULT_METRICS_PORT: u16 = 9091;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:5000").
    pub bind_addr: String,

    /// SQLite database file, or [`MEMORY_DB_PATH`].
    pub db_path: PathBuf,

    /// Mode in effect at start-up.
    pub default_mode: String,

    /// Per-subscriber live queue capacity.
    pub subscriber_buffer: usize,

    /// Period of the demo reading source.
    pub demo_interval: Duration,

    /// Prometheus exporter port; `None` disables the exporter.
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            default_mode: DEFAULT_MODE.to_string(),
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            demo_interval: Duration::from_millis(DEFAULT_DEMO_INTERVAL_MS),
            metrics_port: Some(DEFAULT_METRICS_PORT),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - None (all have defaults for local development)
    ///
    /// Optional:
    /// - `POTHOLE_BIND_ADDR`: Server bind address (default: "0.0.0.0:5000")
    /// - `POTHOLE_DB_PATH`: SQLite file, or ":memory:" (default: "./data/readings.db")
    /// - `POTHOLE_DEFAULT_MODE`: Initial mode (default: "hardware")
    /// - `POTHOLE_SUBSCRIBER_BUFFER`: Live queue capacity per subscriber (default: 64)
    /// - `POTHOLE_DEMO_INTERVAL_MS`: Demo reading period (default: 500)
    /// - `POTHOLE_METRICS_PORT`: Prometheus port, 0 disables (default: 9091)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr =
            std::env::var("POTHOLE_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        let db_path = std::env::var("POTHOLE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let default_mode = std::env::var("POTHOLE_DEFAULT_MODE")
            .map(|m| m.trim().to_string())
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODE.to_string());

        let subscriber_buffer =
            parse_var("POTHOLE_SUBSCRIBER_BUFFER", DEFAULT_SUBSCRIBER_BUFFER)?.max(1);

        let demo_interval = Duration::from_millis(parse_var(
            "POTHOLE_DEMO_INTERVAL_MS",
            DEFAULT_DEMO_INTERVAL_MS,
        )?);
        if demo_interval.is_zero() {
            anyhow::bail!("POTHOLE_DEMO_INTERVAL_MS must be greater than zero");
        }

        let metrics_port = match parse_var("POTHOLE_METRICS_PORT", DEFAULT_METRICS_PORT)? {
            0 => None,
            port => Some(port),
        };

        tracing::info!(
            bind_addr = %bind_addr,
            db_path = %db_path.display(),
            default_mode = %default_mode,
            subscriber_buffer,
            demo_interval_ms = demo_interval.as_millis() as u64,
            metrics_port = ?metrics_port,
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            db_path,
            default_mode,
            subscriber_buffer,
            demo_interval,
            metrics_port,
        })
    }

    /// Whether readings should be kept in memory instead of SQLite.
    pub fn uses_memory_store(&self) -> bool {
        self.db_path.as_os_str() == MEMORY_DB_PATH
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key}: invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
