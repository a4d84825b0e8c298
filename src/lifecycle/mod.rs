//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → HttpServer stops accepting → in-flight requests drain → Exit
//! ```
//!
//! # Design Decisions
//! - Startup order lives in main.rs: config, logging, metrics, listener, server
//! - Upgraded WebSocket tunnels are detached tasks and end with the process

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
