//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build filter chain → Header trust → Ready
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Pool matchers stop matching → Server drains → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then matchers, then listeners
//! - Any startup error is fatal; a gate that cannot load its tables does not serve

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{prepare, Gate, StartupError};
