//! Redirects to named destinations such as the login page.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

use crate::routing::IncomingRequest;

/// Destination name of the login page.
pub const LOGIN: &str = "login";

/// Builds a redirect to a named destination with an optional return path.
pub trait Redirector: Send + Sync {
    fn redirect(&self, req: &IncomingRequest, destination: &str, to: Option<&str>) -> Response;
}

/// Redirects `login` to the configured login path and any other name to `/{name}`.
#[derive(Debug, Clone)]
pub struct LoginRedirector {
    login_path: String,
}

impl LoginRedirector {
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }

    /// `Location` value for `destination`.
    pub fn location(&self, destination: &str, to: Option<&str>) -> String {
        let mut location = if destination == LOGIN {
            self.login_path.clone()
        } else {
            format!("/{destination}")
        };
        if let Some(to) = to {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("to", to)
                .finish();
            location.push('?');
            location.push_str(&query);
        }
        location
    }
}

impl Redirector for LoginRedirector {
    fn redirect(&self, req: &IncomingRequest, destination: &str, to: Option<&str>) -> Response {
        let location = self.location(destination, to);
        tracing::info!(
            method = %req.method,
            path = %req.path,
            location = %location,
            "Redirecting unauthenticated request"
        );
        (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_without_return_path() {
        let redirector = LoginRedirector::new("/login");
        assert_eq!(redirector.location(LOGIN, None), "/login");
    }

    #[test]
    fn return_path_is_escaped() {
        let redirector = LoginRedirector::new("/login");
        assert_eq!(
            redirector.location(LOGIN, Some("/8080/settings")),
            "/login?to=%2F8080%2Fsettings"
        );
    }

    #[test]
    fn other_destinations() {
        let redirector = LoginRedirector::new("/auth/login");
        assert_eq!(redirector.location("logout", None), "/logout");
        assert_eq!(redirector.location(LOGIN, None), "/auth/login");
    }
}
