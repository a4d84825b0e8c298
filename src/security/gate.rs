//! Session gate in front of every proxied request.
//!
//! # State Machine
//! ```text
//! HTTP:       Start → { Redirect | Unauthorized | Proceed → Proxied }
//! WebSocket:  Start → Authenticating → { Failed | Proceed → Proxied }
//! ```
//!
//! # Design Decisions
//! - The gate hands out a `Clearance`; targets can only be resolved through it
//! - Visiting the bare backend root while signed out goes to the login page
//! - Anything deeper answers 401 so API clients never follow a login redirect

use axum::http::HeaderMap;

use crate::error::{ProxyError, ProxyResult};
use crate::routing::request::{normalize, IncomingRequest};
use crate::routing::target::{resolve_target, ProxyTarget, TargetMode};
use crate::security::session::SessionAuthority;

/// Proof that a request passed the session gate.
#[derive(Debug)]
pub struct Clearance {
    _sealed: (),
}

impl Clearance {
    fn granted() -> Self {
        Self { _sealed: () }
    }

    /// Resolve the upstream target of an admitted request.
    pub fn resolve(&self, req: &IncomingRequest, mode: TargetMode) -> ProxyTarget {
        resolve_target(req, mode)
    }
}

/// Outcome of the HTTP gate.
#[derive(Debug)]
pub enum Admission {
    Proceed(Clearance),
    /// Send the caller to the login page, returning to `to` afterwards.
    Redirect { to: Option<String> },
    Unauthorized,
}

/// Decide what happens to `req` given the result of the session check.
pub fn admit(req: &IncomingRequest, authenticated: bool) -> Admission {
    if authenticated {
        return Admission::Proceed(Clearance::granted());
    }

    if req.targets_backend_root() {
        let to = normalize(&req.path);
        return Admission::Redirect {
            to: (to != "/").then_some(to),
        };
    }

    Admission::Unauthorized
}

/// HTTP variant: check the session, then branch.
pub async fn admit_http(
    sessions: &dyn SessionAuthority,
    req: &IncomingRequest,
    headers: &HeaderMap,
) -> Admission {
    let authenticated = sessions.check(headers).await;
    admit(req, authenticated)
}

/// WebSocket variant: the upgrade only goes ahead once the session check resolves.
pub async fn ensure_authenticated(
    sessions: &dyn SessionAuthority,
    headers: &HeaderMap,
) -> ProxyResult<Clearance> {
    if sessions.check(headers).await {
        Ok(Clearance::granted())
    } else {
        Err(ProxyError::AuthCheckFailed)
    }
}
