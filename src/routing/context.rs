//! Per-request routing context handed to the transport.

/// Values computed while routing that the response side needs later.
///
/// Built once per request and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteContext {
    base: Option<String>,
}

impl RouteContext {
    /// Context for a rewritten request routed at `path`.
    pub fn rewritten(path: &str) -> Self {
        Self {
            base: Some(base_path(path)),
        }
    }

    /// Passthrough requests carry no base; backend redirects are left alone.
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Prefix for absolute redirects issued by the backend.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }
}

/// First three `/`-separated segments of `path`, e.g. `/proxy/8080/a/b` → `/proxy/8080`.
pub fn base_path(path: &str) -> String {
    path.split('/').take(3).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_is_first_three_segments() {
        assert_eq!(base_path("/proxy/8080/a/b"), "/proxy/8080");
        assert_eq!(base_path("/proxy/8080"), "/proxy/8080");
        assert_eq!(base_path("/8080/foo/bar"), "/8080/foo");
        assert_eq!(base_path("/8080"), "/8080");
    }

    #[test]
    fn contexts() {
        assert_eq!(RouteContext::rewritten("/proxy/9000/x").base(), Some("/proxy/9000"));
        assert_eq!(RouteContext::passthrough().base(), None);
    }
}
