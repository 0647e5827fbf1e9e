// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub spa: SpaConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight connections on shutdown
    pub shutdown_timeout: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Single-page application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SpaConfig {
    /// Directory holding the built application (entry document and assets)
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Files tried, in order, when a directory (including `/`) is requested
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    /// Path every forwarded request is redispatched to
    #[serde(default = "default_forward_target")]
    pub forward_target: String,
    /// Client-side routes forwarded to `forward_target`, matched in order
    #[serde(default = "default_forward_paths")]
    pub forward_paths: Vec<String>,
    /// `max-age` for non-HTML assets, in seconds
    #[serde(default = "default_asset_max_age")]
    pub asset_max_age: u32,
}

#[allow(clippy::missing_const_for_fn)]
fn default_static_dir() -> String {
    "static".to_string()
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string()]
}

#[allow(clippy::missing_const_for_fn)]
fn default_forward_target() -> String {
    "/".to_string()
}

fn default_forward_paths() -> Vec<String> {
    ["/search", "/reservations", "/dashboard", "/flights", "/booking/**"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

const fn default_asset_max_age() -> u32 {
    3600
}

impl Default for SpaConfig {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
            index_files: default_index_files(),
            forward_target: default_forward_target(),
            forward_paths: default_forward_paths(),
            asset_max_age: default_asset_max_age(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    /// Enable health check endpoints
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness probe path (default: /healthz)
    #[serde(default = "default_healthz_path")]
    pub liveness_path: String,
    /// Readiness probe path (default: /readyz)
    #[serde(default = "default_readyz_path")]
    pub readiness_path: String,
}

const fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_healthz_path() -> String {
    "/healthz".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_readyz_path() -> String {
    "/readyz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            liveness_path: default_healthz_path(),
            readiness_path: default_readyz_path(),
        }
    }
}
