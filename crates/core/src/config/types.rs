use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub tracer: TracerConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size for uploads, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

/// Artifact storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory holding artifact files.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
    /// How long an artifact stays downloadable.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    /// How often expired artifacts are swept.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Keep uploaded source images after their job finishes.
    #[serde(default)]
    pub retain_uploads: bool,
    /// Delete generated outputs once they have been downloaded.
    #[serde(default)]
    pub delete_after_download: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            retain_uploads: false,
            delete_after_download: false,
        }
    }
}

impl StorageConfig {
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retention_secs.min(i64::MAX as u64) as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// Remote image fetch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Total request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Largest accepted response body, in bytes.
    #[serde(default = "default_fetch_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            max_bytes: default_fetch_max_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_fetch_max_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_user_agent() -> String {
    concat!("tracery/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Tracing engine (vtracer) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TracerConfig {
    /// Path to the vtracer binary.
    #[serde(default = "default_vtracer_path")]
    pub vtracer_path: PathBuf,
    /// Scratch directory for engine input/output files.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Timeout for a single trace in seconds.
    #[serde(default = "default_tracer_timeout")]
    pub timeout_secs: u64,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            vtracer_path: default_vtracer_path(),
            temp_dir: default_temp_dir(),
            timeout_secs: default_tracer_timeout(),
        }
    }
}

fn default_vtracer_path() -> PathBuf {
    PathBuf::from("vtracer")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("tracery")
}

fn default_tracer_timeout() -> u64 {
    120
}

/// SVG optimizer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptimizerConfig {
    /// Optimize SVG output unless a request opts out.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Decimal places kept for coordinates when re-serializing.
    #[serde(default = "default_coordinates_precision")]
    pub coordinates_precision: u8,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            coordinates_precision: default_coordinates_precision(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_coordinates_precision() -> u8 {
    3
}

/// PNG renderer (rsvg-convert) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RendererConfig {
    /// Path to the rsvg-convert binary.
    #[serde(default = "default_rsvg_path")]
    pub rsvg_path: PathBuf,
    /// Timeout for a single render in seconds.
    #[serde(default = "default_renderer_timeout")]
    pub timeout_secs: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            rsvg_path: default_rsvg_path(),
            timeout_secs: default_renderer_timeout(),
        }
    }
}

fn default_rsvg_path() -> PathBuf {
    PathBuf::from("rsvg-convert")
}

fn default_renderer_timeout() -> u64 {
    60
}

/// Batch execution configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Jobs executed concurrently across all batches.
    #[serde(default = "default_max_parallel_jobs")]
    pub max_parallel_jobs: usize,
    /// Largest number of items accepted in one request.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_parallel_jobs: default_max_parallel_jobs(),
            max_items: default_max_items(),
        }
    }
}

fn default_max_parallel_jobs() -> usize {
    4
}

fn default_max_items() -> usize {
    50
}
