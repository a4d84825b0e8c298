//! Sign-in and sign-out endpoints backing the session store.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::security::session::{cookie_value, SessionStore};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub password: String,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutQuery {
    #[serde(default)]
    pub to: Option<String>,
}

/// `GET login_path` explains how to sign in, `POST login_path` signs in,
/// `GET`/`POST logout_path` signs out.
pub fn login_router(login_path: &str, logout_path: &str, store: Arc<SessionStore>) -> Router {
    Router::new()
        .route(login_path, get(login_hint).post(login))
        .route(logout_path, get(logout).post(logout))
        .with_state(store)
}

async fn login_hint() -> &'static str {
    "Sign in by POSTing a form with `password` (and optionally `to`) to this path.\n"
}

async fn login(State(store): State<Arc<SessionStore>>, Form(form): Form<LoginForm>) -> Response {
    let Some(token) = store.login(&form.password) else {
        return (StatusCode::UNAUTHORIZED, "Invalid password").into_response();
    };

    found(store.session_cookie(&token), form.to.as_deref())
}

async fn logout(
    State(store): State<Arc<SessionStore>>,
    Query(query): Query<LogoutQuery>,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = cookie_value(&headers, store.cookie_name()) {
        store.logout(token);
        tracing::info!(active_sessions = store.active_sessions(), "Session ended");
    }
    found(store.cleared_cookie(), query.to.as_deref())
}

fn found(cookie: String, to: Option<&str>) -> Response {
    let destination = to.filter(|to| is_local_path(to)).unwrap_or("/").to_string();
    (
        StatusCode::FOUND,
        [(header::SET_COOKIE, cookie), (header::LOCATION, destination)],
    )
        .into_response()
}

/// Only same-origin paths are followed after sign-in. Browsers drop tab, CR and LF
/// from URLs, so any control or whitespace character disqualifies the path.
fn is_local_path(to: &str) -> bool {
    to.starts_with('/')
        && !to.starts_with("//")
        && !to.contains('\\')
        && !to.chars().any(|c| c.is_control() || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn store() -> Arc<SessionStore> {
        Arc::new(SessionStore::new("pw", "sid", Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn successful_login_sets_cookie_and_returns() {
        let store = store();
        let res = login_router("/login", "/logout", store.clone())
            .oneshot(post("password=pw&to=%2Fproxy%2F8080"))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/proxy/8080");
        let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("sid="));
        assert_eq!(store.active_sessions(), 1);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let res = login_router("/login", "/logout", store()).oneshot(post("password=nope")).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn foreign_return_path_falls_back_to_root() {
        let res = login_router("/login", "/logout", store())
            .oneshot(post("password=pw&to=%2F%2Fevil.example"))
            .await
            .unwrap();
        assert_eq!(res.headers()[header::LOCATION], "/");

        let res = login_router("/login", "/logout", store())
            .oneshot(post("password=pw&to=%2F%09%2Fevil.example"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn logout_ends_session_and_clears_cookie() {
        let store = store();
        let token = store.login("pw").unwrap();
        let req = Request::builder()
            .uri("/logout?to=%2Fproxy%2F8080")
            .header(header::COOKIE, format!("sid={token}"))
            .body(Body::empty())
            .unwrap();

        let res = login_router("/login", "/logout", store.clone()).oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/proxy/8080");
        assert!(res.headers()[header::SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));
        assert!(!store.is_valid(&token));
    }

    #[test]
    fn local_paths() {
        assert!(is_local_path("/proxy/8080"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path("/\\evil"));
        assert!(!is_local_path("/\t/evil.example"));
        assert!(!is_local_path("/\r\n/evil.example"));
        assert!(!is_local_path("/ /evil.example"));
    }
}
