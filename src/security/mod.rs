//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (peer address, or trusted proxy headers)
//!     → access_control.rs (filter chain decision)
//!     → Pass to upstream, or 403
//! ```
//!
//! # Design Decisions
//! - Fail closed: no determinable client address means deny
//! - No trust in client headers unless explicitly configured

pub mod access_control;
pub mod client_ip;

pub use access_control::{access_control_middleware, AccessControlState, ClientContext};
pub use client_ip::{AddressSource, ExtractedAddress, HeaderSource, IpExtractor};
