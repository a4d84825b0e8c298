//! Upstream target resolution.
//!
//! # Design Decisions
//! - The resolved path is complete; the transport replaces the request URI with it
//! - Passthrough reuses the raw original URL byte for byte, route prefix included
//! - Rewrite rebuilds the query from the parsed mapping

use axum::http::Uri;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProxyError;
use crate::routing::request::IncomingRequest;

/// Scheme used for every upstream.
pub const UPSTREAM_SCHEME: &str = "http";

/// Host every backend port is reached on.
pub const UPSTREAM_HOST: &str = "0.0.0.0";

/// How the upstream path is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    /// `/{subpath}` plus the re-serialized query.
    #[default]
    Rewrite,
    /// The original raw URL, unmodified.
    Passthrough,
}

/// Upstream address of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    pub port: String,
    pub path: String,
    pub query: Option<String>,
}

impl ProxyTarget {
    pub fn scheme(&self) -> &'static str {
        UPSTREAM_SCHEME
    }

    pub fn host(&self) -> &'static str {
        UPSTREAM_HOST
    }

    /// Parse into a request URI. Fails for ports that are not valid authorities.
    pub fn to_uri(&self) -> Result<Uri, ProxyError> {
        let raw = self.to_string();
        raw.parse::<Uri>()
            .map_err(|e| ProxyError::InvalidTarget(format!("{raw}: {e}")))
    }
}

impl fmt::Display for ProxyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}{}", self.scheme(), self.host(), self.port, self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Compute the upstream target for `req`.
///
/// Only reachable through [`crate::security::gate::Clearance`], so a target is never
/// built for a request that has not passed the session gate.
pub(crate) fn resolve_target(req: &IncomingRequest, mode: TargetMode) -> ProxyTarget {
    match mode {
        TargetMode::Passthrough => ProxyTarget {
            port: req.port.clone(),
            path: format!("/{}", req.original_url),
            query: None,
        },
        TargetMode::Rewrite => ProxyTarget {
            port: req.port.clone(),
            path: format!("/{}", req.subpath),
            query: req.query.serialize(),
        },
    }
}
