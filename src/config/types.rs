// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_KEEP_ALIVE_TIMEOUT: u64 = 75;
pub const DEFAULT_READ_TIMEOUT: u64 = 30;
pub const DEFAULT_WRITE_TIMEOUT: u64 = 30;
pub const DEFAULT_ALLOW_ORIGIN: &str = "*";
pub const DEFAULT_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE";
pub const DEFAULT_REDIRECT_TARGET: &str = "/public/test.html";
pub const DEFAULT_STATIC_BASE_PATH: &str = "/public";
pub const DEFAULT_STATIC_ROOT: &str = ".";

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub cors: CorsConfig,
    pub redirect: RedirectConfig,
    pub static_files: StaticFilesConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Runtime worker threads, CPU count when unset
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            workers: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of error, warn, info, debug
    pub level: String,
    /// Log one line per inbound request
    pub access_log: bool,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            access_log: true,
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Connection timing, all values in seconds
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: DEFAULT_KEEP_ALIVE_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// Values answered to CORS preflight requests
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_methods: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: DEFAULT_ALLOW_ORIGIN.to_string(),
            allow_methods: DEFAULT_ALLOW_METHODS.to_string(),
        }
    }
}

/// Target of the `GET /` redirect
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RedirectConfig {
    pub target: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_REDIRECT_TARGET.to_string(),
        }
    }
}

/// Static file serving
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StaticFilesConfig {
    /// URL prefix, also the directory name looked up under `root`
    pub base_path: String,
    /// Directory `base_path` is resolved against
    pub root: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_STATIC_BASE_PATH.to_string(),
            root: DEFAULT_STATIC_ROOT.to_string(),
        }
    }
}
