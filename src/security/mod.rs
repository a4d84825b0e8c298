//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → session.rs (does the caller hold a session?)
//!     → gate.rs (proceed / redirect to login / 401)
//!     → redirect.rs (build the login redirect)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Fail closed: no session means no upstream traffic
//! - The session check always completes before a target is resolved

pub mod gate;
pub mod redirect;
pub mod session;

pub use gate::{Admission, Clearance};
pub use redirect::{LoginRedirector, Redirector};
pub use session::{NoAuth, SessionAuthority, SessionStore};
