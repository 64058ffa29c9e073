//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - marketstore.toml (default configuration)
//! - marketstore.local.toml (git-ignored local overrides)
//! - Environment variables (MKTS_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # marketstore.toml
//! endpoint = "http://marketstore.internal:5993/rpc"
//!
//! [http]
//! timeout_ms = 10000
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! MKTS_ENDPOINT=http://localhost:5993/rpc
//! MKTS_HTTP__TIMEOUT_MS=2500
//! ```

use crate::protocol::DEFAULT_ENDPOINT;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// RPC endpoint of the data service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds. 0 = no timeout.
    #[serde(default)]
    pub timeout_ms: u64,

    /// `User-Agent` header sent with every call
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}
fn default_user_agent() -> String {
    concat!("marketstore-client/", env!("CARGO_PKG_VERSION")).to_string()
}

impl ClientConfig {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. marketstore.toml (base configuration)
    /// 2. marketstore.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (MKTS_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment()
            .merge(Toml::file("marketstore.toml"))
            .merge(Toml::file("marketstore.local.toml"))
            .merge(Env::prefixed("MKTS_").split("__"))
            .extract()
    }

    /// Load configuration from specific file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, figment::Error> {
        Self::figment()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("MKTS_").split("__"))
            .extract()
    }

    /// Configuration pointing at `endpoint`, everything else default
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            endpoint: default_endpoint(),
            logging: LoggingConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_ms: 0,
            user_agent: default_user_agent(),
        }
    }
}
