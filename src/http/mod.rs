//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, peer address capture)
//!     → request.rs (request ID)
//!     → security::access_control (allow-list decision, 403 on deny)
//!     → server.rs forward_handler (stream to upstream)
//!     → Send upstream response to client
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::GateServer;
