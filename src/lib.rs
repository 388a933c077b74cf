//! IP allow-list gate library.

pub mod config;
pub mod filter;
pub mod http;
pub mod ipset;
pub mod lifecycle;
pub mod matcher;
pub mod observability;
pub mod security;

pub use config::GateConfig;
pub use filter::FilterChain;
pub use http::GateServer;
pub use lifecycle::{Gate, Shutdown};
