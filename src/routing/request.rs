//! Inbound request view.
//!
//! # Responsibilities
//! - Split `{prefix}/{port}/{subpath}` into its route parameters
//! - Parse the query string into a stable mapping
//! - Keep the raw path+query exactly as received for passthrough targets
//!
//! # Design Decisions
//! - The port is carried as a string and never validated here
//! - The sub-path is taken from the raw URI so its escapes survive untouched

use axum::http::{Method, Uri};
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Parsed query string.
///
/// Keys are unique and iterate in sorted order. A key given more than once keeps
/// all of its values in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap(BTreeMap<String, Vec<String>>);

impl QueryMap {
    /// Parse a raw `a=1&b=2` query string (without the leading `?`).
    pub fn parse(raw: &str) -> Self {
        let mut map = Self::default();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            map.insert(key, value);
        }
        map
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Re-serialize with RFC 3986 escaping: only `A-Za-z0-9-._~` stay literal.
    /// `None` when there is nothing to send.
    pub fn serialize(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .0
            .iter()
            .flat_map(|(key, values)| {
                values
                    .iter()
                    .map(move |value| format!("{}={}", encode_component(key), encode_component(value)))
            })
            .collect();
        Some(pairs.join("&"))
    }
}

/// Percent-encode one query key or value.
///
/// `byte_serialize` leaves `*` literal, writes space as `+` and escapes `~`;
/// those three are adjusted afterwards. A literal `+` is already `%2B`.
fn encode_component(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
        .replace('*', "%2A")
        .replace("%7E", "~")
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// A request addressed at `{prefix}/{port}/{subpath}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub method: Method,
    /// Backend port as written in the route.
    pub port: String,
    /// Everything after `/{port}/`, possibly empty.
    pub subpath: String,
    pub query: QueryMap,
    /// Raw path and query exactly as received.
    pub original_url: String,
    /// Full request path, mount prefix included.
    pub path: String,
}

impl IncomingRequest {
    /// Build the view of `uri`, which was routed under `prefix`.
    pub fn from_uri(method: Method, uri: &Uri, prefix: &str) -> Self {
        let path = uri.path();
        let rest = path.strip_prefix(prefix).unwrap_or(path);
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let (port, subpath) = rest.split_once('/').unwrap_or((rest, ""));

        Self {
            method,
            port: port.to_string(),
            subpath: subpath.to_string(),
            query: uri.query().map(QueryMap::parse).unwrap_or_default(),
            original_url: uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| path.to_string()),
            path: path.to_string(),
        }
    }

    /// True when the request targets the backend root (`/{port}` or `/{port}/`).
    pub fn targets_backend_root(&self) -> bool {
        self.subpath.is_empty() || self.subpath == "/"
    }
}

/// Collapse repeated slashes and drop trailing ones. An all-slash path becomes `/`.
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    while out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
