//! Filter subsystem.
//!
//! # Data Flow
//! ```text
//! FilterConfig (startup)
//!     → chain.rs (build providers: private, defined, geodb)
//!     → FilterChain (immutable, shared via Arc)
//!
//! Per request:
//!     canonical client address
//!     → FilterChain::decide (first matching provider)
//!     → allow / deny
//! ```
//!
//! # Design Decisions
//! - Logical OR over providers, short-circuiting in registration order
//! - Empty chain denies every address
//! - No registration after startup

pub mod chain;

pub use chain::FilterChain;
