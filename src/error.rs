//! Crate error type

use thiserror::Error;

/// Errors raised while configuring the router or serving a request
#[derive(Debug, Error)]
pub enum Error {
    /// Route pattern rejected by the regex engine
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Request URL contains a malformed percent-escape or non-UTF-8 bytes
    #[error("malformed url encoding: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to build response: {0}")]
    Http(#[from] hyper::http::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Unreadable or malformed `.env` file
    #[error("failed to load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
