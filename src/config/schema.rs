//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::redirect::{RedirectRule, RedirectTable, TableError};

/// Root configuration for the edge service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address, TLS, limits).
    pub listener: ListenerConfig,

    /// Origin that passthrough requests are forwarded to.
    pub origin: OriginConfig,

    /// Redirect rules evaluated on every request.
    pub redirects: RedirectConfig,

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

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum requests in flight across all connections (backpressure).
    pub max_connections: usize,

    /// Maximum request body size forwarded to the origin.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_connections: 10_000,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL of the origin (e.g., "http://127.0.0.1:9000").
    pub url: String,

    /// Object served for requests to `/`. `None` forwards `/` as-is.
    pub default_root_object: Option<String>,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9000".to_string(),
            default_root_object: Some("index.html".to_string()),
        }
    }
}

/// Redirect table configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Paths that are never redirected.
    pub passthrough: Vec<String>,

    /// Exact-path redirect rules.
    pub rules: Vec<RedirectRule>,

    /// Target for every other path.
    pub default_target: String,
}

impl Default for RedirectConfig {
    /// The built-in redirect table, as configuration.
    fn default() -> Self {
        Self::from(&RedirectTable::default())
    }
}

impl From<&RedirectTable> for RedirectConfig {
    fn from(table: &RedirectTable) -> Self {
        Self {
            passthrough: table.passthrough_paths().into_iter().map(String::from).collect(),
            rules: table.rules().to_vec(),
            default_target: table.default_target().to_string(),
        }
    }
}

impl RedirectConfig {
    /// Compile into an immutable lookup table.
    pub fn build_table(&self) -> Result<RedirectTable, TableError> {
        RedirectTable::new(
            self.passthrough.iter().cloned(),
            self.rules.clone(),
            self.default_target.clone(),
        )
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Time allowed for the origin to produce response headers, in seconds.
    pub origin_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            origin_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Log output format ("text" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_redirects_match_builtin_table() {
        let table = EdgeConfig::default().redirects.build_table().unwrap();
        let builtin = RedirectTable::default();
        assert_eq!(table.rules(), builtin.rules());
        assert_eq!(table.passthrough_paths(), builtin.passthrough_paths());
        assert_eq!(table.default_target(), builtin.default_target());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: EdgeConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.origin.default_root_object.as_deref(), Some("index.html"));
        assert_eq!(config.redirects.rules.len(), 1);
        assert_eq!(config.timeouts.origin_secs, 10);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_redirects_section() {
        let config: EdgeConfig = toml::from_str(
            r#"
            [redirects]
            default_target = "https://example.com/"

            [[redirects.rules]]
            match_path = "/old"
            target_url = "https://example.com/new"
            "#,
        )
        .unwrap();

        assert_eq!(config.redirects.passthrough, vec!["/", "/index.html"]);
        assert_eq!(config.redirects.rules, vec![RedirectRule::new("/old", "https://example.com/new")]);
        assert_eq!(config.redirects.default_target, "https://example.com/");
    }
}
