//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → path_proxy.rs (session gate, target resolution)
//!     → transport.rs (hyper client) / websocket.rs (upgrade tunnel)
//!     → response.rs (hop-by-hop headers, redirect rebasing)
//!     → Send to client
//!
//! login.rs serves the sign-in and sign-out endpoints next to the proxy mounts.
//! ```

pub mod login;
pub mod path_proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod transport;
pub mod websocket;

pub use path_proxy::PathProxy;
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::HttpServer;
pub use transport::{HyperTransport, Transport};
