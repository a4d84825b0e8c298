//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request ({prefix}/{port}/{subpath}?{query})
//!     → request.rs (split route parameters, parse query)
//!     → [security gate admits the request]
//!     → target.rs (resolve upstream URL, rewrite or passthrough)
//!     → context.rs (base path for redirect rewriting, rewrite mode only)
//!     → Return: ProxyTarget + RouteContext
//! ```
//!
//! # Design Decisions
//! - One target per request, always on the loopback host
//! - Port is forwarded unvalidated; the transport owns connect failures
//! - Deterministic: same input always resolves to the same target

pub mod context;
pub mod request;
pub mod target;

pub use context::RouteContext;
pub use request::{IncomingRequest, QueryMap};
pub use target::{ProxyTarget, TargetMode};
