//! Session checks.
//!
//! # Responsibilities
//! - Define the capability the proxy asks "is this caller signed in?"
//! - Provide an in-memory cookie session store for the bundled binary
//! - Provide an always-admit authority for `auth.mode = "none"`
//!
//! # Design Decisions
//! - One async `check` serves both the HTTP and WebSocket paths
//! - Tokens are random UUIDs; the password never leaves the process
//! - Expired sessions are dropped lazily on lookup and on login

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Decides whether a caller holds a valid session.
#[async_trait]
pub trait SessionAuthority: Send + Sync {
    /// Resolve the session carried by `headers`.
    async fn check(&self, headers: &HeaderMap) -> bool;
}

/// Admits every caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl SessionAuthority for NoAuth {
    async fn check(&self, _headers: &HeaderMap) -> bool {
        true
    }
}

/// Password-backed session store keyed by cookie token.
#[derive(Debug)]
pub struct SessionStore {
    password: String,
    cookie_name: String,
    ttl: Duration,
    /// token → expiry
    sessions: DashMap<String, Instant>,
}

impl SessionStore {
    pub fn new(password: impl Into<String>, cookie_name: impl Into<String>, ttl: Duration) -> Self {
        Self {
            password: password.into(),
            cookie_name: cookie_name.into(),
            ttl,
            sessions: DashMap::new(),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Issue a session token when `password` matches.
    pub fn login(&self, password: &str) -> Option<String> {
        if !constant_time_eq(password.as_bytes(), self.password.as_bytes()) {
            tracing::warn!("Login rejected: wrong password");
            return None;
        }

        self.prune();
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), Instant::now() + self.ttl);
        tracing::info!(active_sessions = self.sessions.len(), "Session issued");
        Some(token)
    }

    pub fn logout(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// True when `token` names a live session.
    pub fn is_valid(&self, token: &str) -> bool {
        let expired = match self.sessions.get(token) {
            Some(expiry) => *expiry <= Instant::now(),
            None => return false,
        };
        if expired {
            self.sessions.remove(token);
            return false;
        }
        true
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            token,
            self.ttl.as_secs()
        )
    }

    /// `Set-Cookie` value that makes the browser drop the session cookie.
    pub fn cleared_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.cookie_name)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn prune(&self) {
        let now = Instant::now();
        self.sessions.retain(|_, expiry| *expiry > now);
    }
}

#[async_trait]
impl SessionAuthority for SessionStore {
    async fn check(&self, headers: &HeaderMap) -> bool {
        cookie_value(headers, &self.cookie_name).is_some_and(|token| self.is_valid(token))
    }
}

/// Byte equality whose running time does not depend on where the inputs differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Value of cookie `name` across every `Cookie` header.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
