//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration for the gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// The protected service allowed requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Allow-list filter settings.
    pub filter: FilterConfig,

    /// Timeout configuration.
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

/// Upstream service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Allow-list filter configuration.
///
/// Keys are camelCase to stay compatible with existing plugin configs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    /// When false every request passes through untouched.
    pub enabled: bool,

    /// Allow loopback and private ranges.
    pub allow_private: bool,

    /// Trust proxy headers for the client address.
    /// Only safe behind a reverse proxy that overwrites them.
    pub header_bearer: bool,

    /// Header names tried in order when `header_bearer` is set.
    pub headers: Vec<String>,

    /// Locations table (id → country code).
    pub code_file: Option<String>,

    /// Blocks tables (network → id). `geoFile` accepts a single path.
    #[serde(alias = "geoFile", deserialize_with = "one_or_many")]
    pub geo_files: Vec<String>,

    /// Requested country codes.
    pub tags: Vec<String>,

    /// Literal subnets or addresses.
    pub defined: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_private: false,
            header_bearer: false,
            headers: default_headers(),
            code_file: None,
            geo_files: Vec::new(),
            tags: Vec::new(),
            defined: Vec::new(),
        }
    }
}

fn default_headers() -> Vec<String> {
    vec![
        "X-Real-IP".to_string(),
        "X-Forwarded-For".to_string(),
        "Forwarded".to_string(),
    ]
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    })
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
