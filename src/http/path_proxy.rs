//! Port-addressed proxy routes.
//!
//! # Responsibilities
//! - Mount `{prefix}/{port}`, `{prefix}/{port}/` and `{prefix}/{port}/{*subpath}`
//! - Run the session gate before anything else
//! - Resolve the target in the mount's mode and hand it to the transport
//!
//! # Data Flow
//! ```text
//! Request
//!     → IncomingRequest (port, subpath, query, raw url)
//!     → Upgrade?  no  → gate::admit_http → Redirect | 401 | Proceed → transport.proxy_http
//!                 yes → gate::ensure_authenticated → 401 | Proceed → transport.proxy_websocket
//! ```

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::sync::Arc;

use crate::error::{ProxyError, ProxyResult};
use crate::http::request::request_id;
use crate::http::transport::{self, Transport};
use crate::http::websocket;
use crate::observability::metrics;
use crate::routing::{IncomingRequest, RouteContext, TargetMode};
use crate::security::gate::{self, Admission};
use crate::security::redirect::{Redirector, LOGIN};
use crate::security::session::SessionAuthority;

/// One mount of the port proxy.
pub struct PathProxy {
    prefix: String,
    mode: TargetMode,
    sessions: Arc<dyn SessionAuthority>,
    redirector: Arc<dyn Redirector>,
    transport: Arc<dyn Transport>,
}

impl PathProxy {
    pub fn new(
        prefix: impl Into<String>,
        mode: TargetMode,
        sessions: Arc<dyn SessionAuthority>,
        redirector: Arc<dyn Redirector>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            mode,
            sessions,
            redirector,
            transport,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    /// Routes for this mount.
    pub fn into_router(self) -> Router {
        let prefix = self.prefix.clone();
        Router::new()
            .route(&format!("{prefix}/{{port}}"), any(proxy_handler))
            .route(&format!("{prefix}/{{port}}/"), any(proxy_handler))
            .route(&format!("{prefix}/{{port}}/{{*subpath}}"), any(proxy_handler))
            .with_state(Arc::new(self))
    }

    /// Gate, resolve and delegate a single request.
    pub async fn handle(&self, req: Request<Body>) -> ProxyResult<Response> {
        let incoming = IncomingRequest::from_uri(req.method().clone(), req.uri(), &self.prefix);
        if websocket::is_upgrade_request(req.headers()) {
            self.proxy_websocket(incoming, req).await
        } else {
            self.proxy_http(incoming, req).await
        }
    }

    async fn proxy_http(&self, incoming: IncomingRequest, req: Request<Body>) -> ProxyResult<Response> {
        let headers = req.headers();
        let admission = gate::admit_http(self.sessions.as_ref(), &incoming, headers).await;

        match admission {
            Admission::Redirect { to } => {
                metrics::record_outcome(self.mode, "redirect");
                Ok(self.redirector.redirect(&incoming, LOGIN, to.as_deref()))
            }
            Admission::Unauthorized => {
                tracing::warn!(
                    request_id = %request_id(req.headers()),
                    path = %incoming.path,
                    "Rejected unauthenticated request"
                );
                metrics::record_outcome(self.mode, "unauthorized");
                Err(ProxyError::Unauthorized)
            }
            Admission::Proceed(clearance) => {
                let target = clearance.resolve(&incoming, self.mode);
                let ctx = match self.mode {
                    TargetMode::Rewrite => RouteContext::rewritten(&incoming.path),
                    TargetMode::Passthrough => RouteContext::passthrough(),
                };

                tracing::debug!(
                    request_id = %request_id(req.headers()),
                    method = %incoming.method,
                    path = %incoming.path,
                    upstream = %target,
                    "Proxying request"
                );
                let response = self.transport.proxy_http(req, target, ctx).await;
                metrics::record_outcome(self.mode, transport::outcome(&response));
                Ok(response)
            }
        }
    }

    async fn proxy_websocket(&self, incoming: IncomingRequest, req: Request<Body>) -> ProxyResult<Response> {
        let headers = req.headers();
        let clearance = match gate::ensure_authenticated(self.sessions.as_ref(), headers).await {
            Ok(clearance) => clearance,
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id(req.headers()),
                    path = %incoming.path,
                    "Rejected unauthenticated WebSocket upgrade"
                );
                metrics::record_outcome(self.mode, "auth_failed");
                return Err(e);
            }
        };

        let target = clearance.resolve(&incoming, self.mode);
        tracing::debug!(
            request_id = %request_id(req.headers()),
            path = %incoming.path,
            upstream = %target,
            "Proxying WebSocket upgrade"
        );
        let response = self.transport.proxy_websocket(req, target).await;
        metrics::record_outcome(self.mode, transport::outcome(&response));
        Ok(response)
    }
}

async fn proxy_handler(
    State(proxy): State<Arc<PathProxy>>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    proxy.handle(request).await
}
