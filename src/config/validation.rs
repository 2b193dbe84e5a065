//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and value ranges
//! - Detect duplicate redirect rules
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::EdgeConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: {reason} ({value:?})")]
    InvalidUrl {
        field: String,
        value: String,
        reason: &'static str,
    },

    #[error("{field}: path {value:?} must start with '/'")]
    InvalidPath { field: String, value: String },

    #[error("redirects.rules: duplicate match_path {0:?}")]
    DuplicateRule(String),

    #[error("origin.default_root_object: must be a non-empty object key without a leading '/'")]
    InvalidRootObject,

    #[error("timeouts.origin_secs: {origin_secs}s must be shorter than timeouts.request_secs ({request_secs}s)")]
    OriginTimeoutNotShorter { origin_secs: u64, request_secs: u64 },

    #[error("observability.log_format: unknown format {0:?} (expected \"text\" or \"json\")")]
    InvalidLogFormat(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_connections" });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_body_bytes" });
    }

    if let Err(reason) = check_url(&config.origin.url, &["http"]).and_then(|url| check_base_url(&url)) {
        errors.push(ValidationError::InvalidUrl {
            field: "origin.url".into(),
            value: config.origin.url.clone(),
            reason,
        });
    }
    if let Some(object) = &config.origin.default_root_object {
        if object.is_empty() || object.starts_with('/') {
            errors.push(ValidationError::InvalidRootObject);
        }
    }

    let redirects = &config.redirects;
    for (i, path) in redirects.passthrough.iter().enumerate() {
        if !path.starts_with('/') {
            errors.push(ValidationError::InvalidPath {
                field: format!("redirects.passthrough[{}]", i),
                value: path.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    for (i, rule) in redirects.rules.iter().enumerate() {
        if !rule.match_path.starts_with('/') {
            errors.push(ValidationError::InvalidPath {
                field: format!("redirects.rules[{}].match_path", i),
                value: rule.match_path.clone(),
            });
        }
        if !seen.insert(rule.match_path.as_str()) {
            errors.push(ValidationError::DuplicateRule(rule.match_path.clone()));
        }
        if let Err(reason) = check_url(&rule.target_url, &["http", "https"]) {
            errors.push(ValidationError::InvalidUrl {
                field: format!("redirects.rules[{}].target_url", i),
                value: rule.target_url.clone(),
                reason,
            });
        }
    }

    if let Err(reason) = check_url(&redirects.default_target, &["http", "https"]) {
        errors.push(ValidationError::InvalidUrl {
            field: "redirects.default_target".into(),
            value: redirects.default_target.clone(),
            reason,
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.timeouts.origin_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.origin_secs" });
    }
    // Otherwise the request deadline fires first and the origin timeout is never reported.
    let timeouts = &config.timeouts;
    if timeouts.request_secs > 0 && timeouts.origin_secs >= timeouts.request_secs {
        errors.push(ValidationError::OriginTimeoutNotShorter {
            origin_secs: timeouts.origin_secs,
            request_secs: timeouts.request_secs,
        });
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }
    if !matches!(observability.log_format.as_str(), "text" | "json") {
        errors.push(ValidationError::InvalidLogFormat(observability.log_format.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(value: &str, schemes: &[&str]) -> Result<Url, &'static str> {
    let url = Url::parse(value).map_err(|_| "not an absolute URL")?;
    if !schemes.contains(&url.scheme()) {
        return Err("unsupported scheme");
    }
    if url.host_str().is_none() {
        return Err("missing host");
    }
    Ok(url)
}

/// The origin receives the client's path unchanged, so only a bare authority works.
fn check_base_url(url: &Url) -> Result<(), &'static str> {
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a path, query or fragment");
    }
    Ok(())
}
