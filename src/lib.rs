//! Port-addressed HTTP and WebSocket path proxy.
//!
//! `/{prefix}/{port}/{subpath}` on the public listener is forwarded to the
//! service listening on `{port}` of the local machine, behind a session gate.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use http::{HttpServer, PathProxy};
pub use lifecycle::Shutdown;
