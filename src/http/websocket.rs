//! WebSocket proxy handling.
//!
//! # Responsibilities
//! - Detect WebSocket upgrade requests
//! - Forward the upgrade handshake to the backend
//! - Splice the two upgraded connections together
//!
//! # Data Flow
//! ```text
//! Client ──GET Upgrade──→ Proxy ──GET Upgrade──→ Backend
//! Client ←──── 101 ────── Proxy ←──── 101 ────── Backend
//! Client ←═══ raw bytes ═══ Proxy ═══ raw bytes ═══→ Backend
//! ```
//!
//! # Design Decisions
//! - Byte-level tunnel, no frame parsing: subprotocols and extensions pass through
//! - The backend answers the handshake, so `Sec-WebSocket-Accept` is its own
//! - A non-101 backend answer is relayed to the client as a normal response
//! - Bytes the client sent after its handshake are replayed by hyper's upgrade

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, Response, StatusCode, Version},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioIo,
};
use std::time::Instant;

use crate::error::{ProxyError, ProxyResult};
use crate::http::response::into_client_response;
use crate::observability::metrics;
use crate::routing::{ProxyTarget, RouteContext};

/// True for `Connection: upgrade` + `Upgrade: websocket`.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    let connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    let upgrade_websocket = headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("websocket"));

    connection_upgrade && upgrade_websocket
}

/// Forward the upgrade in `req` to `target` and, once both sides switch
/// protocols, tunnel bytes between them in a background task.
pub async fn tunnel(
    client: &Client<HttpConnector, Body>,
    mut req: Request<Body>,
    target: ProxyTarget,
) -> ProxyResult<Response<Body>> {
    let uri = target.to_uri()?;
    let client_upgrade = hyper::upgrade::on(&mut req);

    let (mut parts, _body) = req.into_parts();
    parts.uri = uri;
    parts.version = Version::HTTP_11;
    parts.extensions.clear();

    let start = Instant::now();
    let mut upstream = client
        .request(Request::from_parts(parts, Body::empty()))
        .await
        .map_err(|e| ProxyError::Upstream(e.to_string()))?;
    metrics::record_upstream("websocket", start);

    if upstream.status() != StatusCode::SWITCHING_PROTOCOLS {
        tracing::warn!(
            upstream = %target,
            status = %upstream.status(),
            "Backend declined WebSocket upgrade"
        );
        return Ok(into_client_response(upstream, &RouteContext::passthrough()));
    }

    let upstream_upgrade = hyper::upgrade::on(&mut upstream);
    tokio::spawn(async move {
        match tokio::try_join!(client_upgrade, upstream_upgrade) {
            Ok((client_io, upstream_io)) => {
                let mut client_io = TokioIo::new(client_io);
                let mut upstream_io = TokioIo::new(upstream_io);
                match tokio::io::copy_bidirectional(&mut client_io, &mut upstream_io).await {
                    Ok((from_client, from_backend)) => tracing::debug!(
                        upstream = %target,
                        from_client,
                        from_backend,
                        "WebSocket tunnel closed"
                    ),
                    Err(e) => tracing::debug!(upstream = %target, error = %e, "WebSocket tunnel aborted"),
                }
            }
            Err(e) => tracing::warn!(upstream = %target, error = %e, "WebSocket upgrade did not complete"),
        }
    });

    let (parts, _body) = upstream.into_parts();
    Ok(Response::from_parts(parts, Body::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn detects_websocket_upgrade() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, Upgrade"));
        headers.insert(header::UPGRADE, HeaderValue::from_static("WebSocket"));
        assert!(is_upgrade_request(&headers));
    }

    #[test]
    fn plain_requests_are_not_upgrades() {
        let mut headers = HeaderMap::new();
        assert!(!is_upgrade_request(&headers));

        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        assert!(!is_upgrade_request(&headers));

        headers.insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
        headers.insert(header::UPGRADE, HeaderValue::from_static("h2c"));
        assert!(!is_upgrade_request(&headers));
    }
}
