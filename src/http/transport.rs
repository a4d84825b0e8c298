//! Transport that carries admitted requests to the backend.
//!
//! # Responsibilities
//! - Replace the request URI with the resolved target (no path merging)
//! - Strip hop-by-hop headers on the way in and out
//! - Hand WebSocket upgrades to the tunnel
//! - Turn connect and protocol failures into 502
//!
//! # Design Decisions
//! - Injected as `Arc<dyn Transport>` so handlers can be driven against a test double
//! - The `Host` header is forwarded unchanged
//! - Always HTTP/1.1 upstream; backends on a loopback port rarely speak h2c

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Version},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::{Duration, Instant};

use crate::error::{ProxyError, ProxyResult};
use crate::http::response::{into_client_response, strip_hop_by_hop};
use crate::http::websocket;
use crate::observability::metrics;
use crate::routing::{ProxyTarget, RouteContext};

/// Marks a response the transport produced itself because the backend exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamFailed;

/// Outcome label for a response returned by a [`Transport`].
pub fn outcome(response: &Response) -> &'static str {
    if response.extensions().get::<UpstreamFailed>().is_some() {
        "upstream_error"
    } else {
        "proxied"
    }
}

fn failed(e: ProxyError) -> Response {
    let mut response = e.into_response();
    response.extensions_mut().insert(UpstreamFailed);
    response
}

/// Network delegation for admitted requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `req` to `target` and stream the backend's answer back.
    async fn proxy_http(&self, req: Request<Body>, target: ProxyTarget, ctx: RouteContext) -> Response;

    /// Forward the WebSocket upgrade in `req` to `target`.
    async fn proxy_websocket(&self, req: Request<Body>, target: ProxyTarget) -> Response;
}

/// hyper-based transport.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpConnector, Body>,
}

impl HyperTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }

    async fn forward(&self, req: Request<Body>, target: &ProxyTarget, ctx: &RouteContext) -> ProxyResult<Response> {
        let (mut parts, body) = req.into_parts();
        parts.uri = target.to_uri()?;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);

        let start = Instant::now();
        let response = self
            .client
            .request(Request::from_parts(parts, body))
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;
        metrics::record_upstream("http", start);

        Ok(into_client_response(response, ctx))
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn proxy_http(&self, req: Request<Body>, target: ProxyTarget, ctx: RouteContext) -> Response {
        match self.forward(req, &target, &ctx).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(upstream = %target, error = %e, "Upstream request failed");
                failed(e)
            }
        }
    }

    async fn proxy_websocket(&self, req: Request<Body>, target: ProxyTarget) -> Response {
        let upstream = target.to_string();
        match websocket::tunnel(&self.client, req, target).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(upstream = %upstream, error = %e, "WebSocket upgrade failed");
                failed(e)
            }
        }
    }
}
