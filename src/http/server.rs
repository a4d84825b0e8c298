//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: both proxy mounts plus the sign-in endpoints
//! - Pick the session authority from `auth.mode`
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve on a bound listener until shutdown is signalled

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AuthMode, ProxyConfig};
use crate::http::login::login_router;
use crate::http::path_proxy::PathProxy;
use crate::http::request::MakeRequestUuidV4;
use crate::http::transport::{HyperTransport, Transport};
use crate::routing::TargetMode;
use crate::security::redirect::{LoginRedirector, Redirector};
use crate::security::session::{NoAuth, SessionAuthority, SessionStore};

/// HTTP server for the path proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that reaches backends through hyper.
    pub fn new(config: ProxyConfig) -> Self {
        let transport = HyperTransport::new(Duration::from_secs(config.timeouts.connect_secs));
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a server with a caller-supplied transport.
    pub fn with_transport(config: ProxyConfig, transport: Arc<dyn Transport>) -> Self {
        let redirector: Arc<dyn Redirector> =
            Arc::new(LoginRedirector::new(config.auth.login_path.clone()));

        let (sessions, login): (Arc<dyn SessionAuthority>, Option<Router>) = match config.auth.mode {
            AuthMode::None => {
                tracing::warn!("Authentication disabled; every caller is treated as signed in");
                (Arc::new(NoAuth), None)
            }
            AuthMode::Password => {
                let store = Arc::new(SessionStore::new(
                    config.auth.password.clone(),
                    config.auth.cookie_name.clone(),
                    Duration::from_secs(config.auth.session_ttl_secs),
                ));
                let login = login_router(&config.auth.login_path, &config.auth.logout_path, store.clone());
                (store, Some(login))
            }
        };

        let mounts = [
            (&config.proxy.rewrite_prefix, TargetMode::Rewrite),
            (&config.proxy.passthrough_prefix, TargetMode::Passthrough),
        ];
        let mut app = Router::new();
        for (prefix, mode) in mounts {
            let proxy = PathProxy::new(
                prefix.clone(),
                mode,
                sessions.clone(),
                redirector.clone(),
                transport.clone(),
            );
            tracing::debug!(prefix = %proxy.prefix(), mode = ?proxy.mode(), "Mounted port proxy");
            app = app.merge(proxy.into_router());
        }
        if let Some(login) = login {
            app = app.merge(login);
        }

        let router = Self::build_router(&config, app);
        Self { router, config }
    }

    /// Wrap the routes in the middleware stack. Request IDs are set outermost.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, app: Router) -> Router {
        app.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rewrite_prefix = %self.config.proxy.rewrite_prefix,
            passthrough_prefix = %self.config.proxy.passthrough_prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{ProxyTarget, RouteContext};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::{IntoResponse, Response};
    use tower::ServiceExt;

    struct EchoTarget;

    #[async_trait]
    impl Transport for EchoTarget {
        async fn proxy_http(&self, _req: Request<Body>, target: ProxyTarget, _ctx: RouteContext) -> Response {
            target.to_string().into_response()
        }

        async fn proxy_websocket(&self, _req: Request<Body>, _target: ProxyTarget) -> Response {
            StatusCode::SWITCHING_PROTOCOLS.into_response()
        }
    }

    fn server(mode: AuthMode) -> HttpServer {
        let mut config = ProxyConfig::default();
        config.auth.mode = mode;
        config.auth.password = "pw".into();
        HttpServer::with_transport(config, Arc::new(EchoTarget))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn both_mounts_are_routed() {
        let router = server(AuthMode::None).router();

        let res = router.clone().oneshot(get("/proxy/8080/a?b=1")).await.unwrap();
        assert_eq!(body(res).await, "http://0.0.0.0:8080/a?b=1");

        let res = router.oneshot(get("/absproxy/8080/a?b=1")).await.unwrap();
        assert_eq!(body(res).await, "http://0.0.0.0:8080//absproxy/8080/a?b=1");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let res = server(AuthMode::None).router().oneshot(get("/proxy/8080/")).await.unwrap();
        assert!(res.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn login_route_exists_only_in_password_mode() {
        let res = server(AuthMode::Password).router().oneshot(get("/login")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = server(AuthMode::None).router().oneshot(get("/login")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn password_mode_gates_the_mounts() {
        let res = server(AuthMode::Password).router().oneshot(get("/absproxy/8080")).await.unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/login?to=%2Fabsproxy%2F8080");
    }
}
