// Configuration module entry point
// Loads the router's configuration from file, environment and defaults

mod types;

use std::net::SocketAddr;
use std::path::Path;

pub use types::{
    Config, CorsConfig, LoggingConfig, PerformanceConfig, RedirectConfig, ServerConfig,
    StaticFilesConfig,
};

use crate::error::Result;
use types::{
    DEFAULT_ALLOW_METHODS, DEFAULT_ALLOW_ORIGIN, DEFAULT_HOST, DEFAULT_KEEP_ALIVE_TIMEOUT,
    DEFAULT_LOG_LEVEL, DEFAULT_PORT, DEFAULT_READ_TIMEOUT, DEFAULT_REDIRECT_TARGET,
    DEFAULT_STATIC_BASE_PATH, DEFAULT_STATIC_ROOT, DEFAULT_WRITE_TIMEOUT,
};

/// Default config file, extension resolved by the `config` crate
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable that overrides `server.port` on its own
pub const PORT_ENV: &str = "PORT";

/// `KEY=value` file read into the environment before loading
pub const ENV_FILE: &str = ".env";

/// Export the variables of an env file into the process environment
///
/// Variables already set win over the file. A missing file is not an
/// error; returns whether one was read.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl Config {
    /// Load configuration from the default `config.toml` (if any)
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (extension optional)
    ///
    /// Precedence, lowest first: defaults, file, `SUBWAY_*` variables, `PORT`.
    pub fn load_from(config_path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("logging.level", DEFAULT_LOG_LEVEL)?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", DEFAULT_KEEP_ALIVE_TIMEOUT)?
            .set_default("performance.read_timeout", DEFAULT_READ_TIMEOUT)?
            .set_default("performance.write_timeout", DEFAULT_WRITE_TIMEOUT)?
            .set_default("cors.allow_origin", DEFAULT_ALLOW_ORIGIN)?
            .set_default("cors.allow_methods", DEFAULT_ALLOW_METHODS)?
            .set_default("redirect.target", DEFAULT_REDIRECT_TARGET)?
            .set_default("static_files.base_path", DEFAULT_STATIC_BASE_PATH)?
            .set_default("static_files.root", DEFAULT_STATIC_ROOT)?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SUBWAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", std::env::var(PORT_ENV).ok())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.server.host, self.server.port).parse()?)
    }
}
