//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the upstream endpoint and fixed request fields
//! - Detect duplicate or malformed routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} '{value}': not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid upstream endpoint '{0}': {1}")]
    InvalidEndpoint(String, String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("at least one route is required")]
    NoRoutes,

    #[error("route '{0}' must start with '/'")]
    RelativeRoute(String),

    #[error("route '{0}' is declared more than once")]
    DuplicateRoute(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.request_secs ({request}) must exceed upstream.timeout_secs ({upstream})")]
    RequestTimeoutTooShort { request: u64, upstream: u64 },
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    match Url::parse(&config.upstream.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidEndpoint(
            config.upstream.endpoint.clone(),
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::InvalidEndpoint(
            config.upstream.endpoint.clone(),
            e.to_string(),
        )),
    }

    let songlist = &config.songlist;
    if songlist.url.is_empty() {
        errors.push(ValidationError::EmptyField("songlist.url"));
    }
    if songlist.uid.is_empty() {
        errors.push(ValidationError::EmptyField("songlist.uid"));
    }
    if songlist.default_avatar.is_empty() {
        errors.push(ValidationError::EmptyField("songlist.default_avatar"));
    }

    if songlist.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }
    let mut seen = HashSet::new();
    for route in &songlist.routes {
        if !route.starts_with('/') {
            errors.push(ValidationError::RelativeRoute(route.clone()));
        }
        if !seen.insert(route.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.clone()));
        }
    }

    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.connect_timeout_secs"));
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    } else if config.timeouts.request_secs <= config.upstream.timeout_secs {
        // The upstream call has to give up first so a stalled fetch ends as 404.
        errors.push(ValidationError::RequestTimeoutTooShort {
            request: config.timeouts.request_secs,
            upstream: config.upstream.timeout_secs,
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.songlist.url = "https://space.bilibili.com/1".into();
        config.songlist.uid = "1".into();
        config.songlist.default_avatar = "https://d/a.png".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = valid_config();
        config.songlist.uid.clear();
        config.songlist.default_avatar.clear();
        config.upstream.timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::EmptyField("songlist.uid")));
        assert!(errors.contains(&ValidationError::EmptyField("songlist.default_avatar")));
        assert!(errors.contains(&ValidationError::ZeroTimeout("upstream.timeout_secs")));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let mut config = valid_config();
        config.upstream.endpoint = "ftp://example.com/list".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidEndpoint(..)));

        config.upstream.endpoint = "not a url".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::InvalidEndpoint(..)));
    }

    #[test]
    fn test_route_checks() {
        let mut config = valid_config();
        config.songlist.routes = vec![
            "/songlist/getView".into(),
            "songlist/other".into(),
            "/songlist/getView".into(),
        ];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::RelativeRoute("songlist/other".into())));
        assert!(errors.contains(&ValidationError::DuplicateRoute("/songlist/getView".into())));

        config.songlist.routes.clear();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoRoutes]));
    }

    #[test]
    fn test_request_timeout_must_exceed_upstream_timeout() {
        let mut config = valid_config();
        config.upstream.timeout_secs = 30;
        config.timeouts.request_secs = 30;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::RequestTimeoutTooShort {
                request: 30,
                upstream: 30,
            }])
        );

        config.timeouts.request_secs = 31;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_err());

        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
