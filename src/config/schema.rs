//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the songlist proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream endpoint and client settings.
    pub upstream: UpstreamConfig,

    /// Fixed request parameters and response post-processing.
    pub songlist: SonglistConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute URL every fetch is POSTed to.
    pub endpoint: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total time allowed for one upstream round trip in seconds.
    pub timeout_secs: u64,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub use_system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.starlwr.com/songlist/getView".to_string(),
            connect_timeout_secs: 5,
            timeout_secs: 30,
            use_system_proxy: true,
        }
    }
}

/// What to do with an upstream payload that has no `data` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingDataPolicy {
    /// Abort the fetch; the cache keeps whatever it had.
    #[default]
    Reject,
    /// Cache and serve the upstream bytes untouched.
    PassThrough,
}

/// Songlist request parameters and avatar handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SonglistConfig {
    /// `url` field of the upstream request body.
    pub url: String,

    /// `uid` field of the upstream request body.
    pub uid: String,

    /// Avatar used when neither upstream nor the cache has one.
    pub default_avatar: String,

    /// Paths bound as `POST` routes; each path is its own cache key.
    pub routes: Vec<String>,

    /// Also store fallback avatars in the avatar entry, not only
    /// upstream-observed ones.
    pub remember_fallback_avatar: bool,

    /// Handling of payloads without a `data` object.
    pub missing_data: MissingDataPolicy,
}

impl Default for SonglistConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            uid: String::new(),
            default_avatar: String::new(),
            routes: vec!["/songlist/getView".to_string()],
            remember_fallback_avatar: false,
            missing_data: MissingDataPolicy::Reject,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    /// Must exceed `upstream.timeout_secs`.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 35 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
