//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Mount prefixes must be single path segments so the route base is well defined
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{AuthMode, ProxyConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let rewrite = &config.proxy.rewrite_prefix;
    let passthrough = &config.proxy.passthrough_prefix;
    if !is_single_segment(rewrite) {
        errors.push(ValidationError::new(
            "proxy.rewrite_prefix",
            format!("'{rewrite}' must be a single segment such as /proxy"),
        ));
    }
    if !is_single_segment(passthrough) {
        errors.push(ValidationError::new(
            "proxy.passthrough_prefix",
            format!("'{passthrough}' must be a single segment such as /absproxy"),
        ));
    }
    if rewrite == passthrough {
        errors.push(ValidationError::new(
            "proxy.passthrough_prefix",
            "must differ from proxy.rewrite_prefix",
        ));
    }

    let endpoints = [
        ("auth.login_path", &config.auth.login_path),
        ("auth.logout_path", &config.auth.logout_path),
    ];
    for (field, path) in endpoints {
        if !path.starts_with('/') || path.contains(['{', '}', '*']) {
            errors.push(ValidationError::new(
                field,
                format!("'{path}' must be an absolute path"),
            ));
        } else if [rewrite, passthrough]
            .iter()
            .filter(|prefix| is_single_segment(prefix))
            .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}/")))
        {
            errors.push(ValidationError::new(field, "must not live under a proxy prefix"));
        }
    }
    if config.auth.login_path == config.auth.logout_path {
        errors.push(ValidationError::new(
            "auth.logout_path",
            "must differ from auth.login_path",
        ));
    }

    if config.auth.mode == AuthMode::Password {
        if config.auth.password.is_empty() {
            errors.push(ValidationError::new("auth.password", "required in password mode"));
        }
        if config.auth.cookie_name.is_empty()
            || !config.auth.cookie_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.push(ValidationError::new(
                "auth.cookie_name",
                "must be non-empty and use only letters, digits, '-' or '_'",
            ));
        }
        if config.auth.session_ttl_secs == 0 {
            errors.push(ValidationError::new("auth.session_ttl_secs", "must be greater than 0"));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `/name`: one non-empty segment with no route syntax.
fn is_single_segment(prefix: &str) -> bool {
    match prefix.strip_prefix('/') {
        Some(rest) => !rest.is_empty() && !rest.contains(['/', '{', '}', '*']),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.auth.password = "secret".into();
        config
    }

    fn fields(config: &ProxyConfig) -> Vec<&'static str> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect()
    }

    #[test]
    fn defaults_with_password_are_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn password_required_unless_auth_disabled() {
        let mut config = ProxyConfig::default();
        assert_eq!(fields(&config), vec!["auth.password"]);

        config.auth.mode = AuthMode::None;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn prefixes_must_be_single_segments() {
        let mut config = valid();
        config.proxy.rewrite_prefix = "/a/b".into();
        config.proxy.passthrough_prefix = "".into();
        assert_eq!(fields(&config), vec!["proxy.rewrite_prefix", "proxy.passthrough_prefix"]);
    }

    #[test]
    fn prefixes_must_differ() {
        let mut config = valid();
        config.proxy.passthrough_prefix = "/proxy".into();
        assert_eq!(fields(&config), vec!["proxy.passthrough_prefix"]);
    }

    #[test]
    fn login_path_outside_prefixes() {
        let mut config = valid();
        config.auth.login_path = "/proxy/login".into();
        assert_eq!(fields(&config), vec!["auth.login_path"]);

        config.auth.login_path = "login".into();
        assert_eq!(fields(&config), vec!["auth.login_path"]);

        config.auth.login_path = "/login".into();
        config.auth.logout_path = "/absproxy".into();
        assert_eq!(fields(&config), vec!["auth.logout_path"]);

        config.auth.logout_path = "/login".into();
        assert_eq!(fields(&config), vec!["auth.logout_path"]);
    }

    #[test]
    fn collects_every_error() {
        let mut config = valid();
        config.listener.bind_address = "nowhere".into();
        config.timeouts.connect_secs = 0;
        config.timeouts.request_secs = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "bad".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors[0].to_string().starts_with("listener.bind_address:"));
    }
}
