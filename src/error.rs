//! Errors surfaced by the path proxy to the caller's error layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures a proxied request can end in.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Caller has no session and asked for something other than the backend root.
    #[error("Unauthorized")]
    Unauthorized,

    /// The session check rejected a WebSocket upgrade.
    #[error("Authentication check failed")]
    AuthCheckFailed,

    /// The resolved target could not be turned into a request URI.
    #[error("Invalid proxy target {0}")]
    InvalidTarget(String),

    /// The backend could not be reached or dropped the exchange.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Unauthorized | ProxyError::AuthCheckFailed => StatusCode::UNAUTHORIZED,
            ProxyError::InvalidTarget(_) | ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_401() {
        assert_eq!(ProxyError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ProxyError::AuthCheckFailed.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn upstream_failures_map_to_502() {
        let err = ProxyError::Upstream("connection refused".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.to_string(), "Upstream error: connection refused");
    }
}
