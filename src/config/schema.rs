//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the path proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where the port-addressed routes are mounted.
    pub proxy: MountConfig,

    /// Session and login settings.
    pub auth: AuthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Mount points of the two proxy modes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MountConfig {
    /// `{prefix}/{port}/{subpath}` is forwarded as `/{subpath}`.
    pub rewrite_prefix: String,

    /// `{prefix}/{port}/{subpath}` is forwarded with its full original URL.
    pub passthrough_prefix: String,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            rewrite_prefix: "/proxy".to_string(),
            passthrough_prefix: "/absproxy".to_string(),
        }
    }
}

/// How callers are authenticated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Password sign-in with a session cookie.
    #[default]
    Password,
    /// Every caller is treated as signed in.
    None,
}

/// Session and login configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,

    /// Sign-in password (password mode only).
    pub password: String,

    /// Name of the session cookie.
    pub cookie_name: String,

    /// Session lifetime in seconds.
    pub session_ttl_secs: u64,

    /// Path of the sign-in endpoint; unauthenticated visitors are redirected here.
    pub login_path: String,

    /// Path that ends the caller's session.
    pub logout_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Password,
            password: String::new(),
            cookie_name: "path-proxy-session".to_string(),
            session_ttl_secs: 24 * 60 * 60,
            login_path: "/login".to_string(),
            logout_path: "/logout".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed until the response head is sent, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
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
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
