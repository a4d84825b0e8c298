//! Response handling and transformation.
//!
//! # Responsibilities
//! - Transform backend response for client
//! - Strip hop-by-hop headers in both directions
//! - Rebase absolute redirects issued by rewritten backends
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - A backend behind `/proxy/{port}` believes it lives at `/`, so a `Location: /x`
//!   has to become `/proxy/{port}/x`
//! - Passthrough backends already see their full public path and are left alone

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Response},
};

use crate::routing::RouteContext;

/// Headers that only describe a single transport hop.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(*name);
    }
}

/// Prefix an absolute `Location` with the route base, if the context has one.
pub fn rewrite_location(headers: &mut HeaderMap, ctx: &RouteContext) {
    let Some(base) = ctx.base() else {
        return;
    };
    let Some(location) = headers.get(header::LOCATION).and_then(|v| v.to_str().ok()) else {
        return;
    };
    if !location.starts_with('/') {
        return;
    }

    let rewritten = format!("{base}{location}");
    match HeaderValue::from_str(&rewritten) {
        Ok(value) => {
            tracing::debug!(location = %rewritten, "Rebased upstream redirect");
            headers.insert(header::LOCATION, value);
        }
        Err(e) => tracing::warn!(error = %e, "Could not rebase upstream redirect"),
    }
}

/// Turn an upstream response into the one sent to the client.
pub fn into_client_response<B>(response: Response<B>, ctx: &RouteContext) -> Response<Body>
where
    B: hyper::body::Body<Data = hyper::body::Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    rewrite_location(&mut parts.headers, ctx);
    Response::from_parts(parts, Body::new(body))
}
