//! Prefix set subsystem.
//!
//! # Data Flow
//! ```text
//! Startup only:
//!     config literals ─────────────────────────┐
//!     locations.csv → geo.rs (CountryIndex)    │
//!     blocks.csv(s) → geo.rs (id join) ────────┤
//!                                              ▼
//!                          prefix_set.rs (builder → canonical PrefixSet)
//!
//! Per request:
//!     PrefixSet::contains(addr)  (binary search, no allocation)
//! ```
//!
//! # Design Decisions
//! - Sets are built once and never mutated
//! - File-backed sources are strict about I/O, lenient about rows

pub mod geo;
pub mod path;
pub mod prefix_set;

pub use geo::{CountryIndex, CountrySource, GeoError, GeoResolver};
pub use path::{resolve_path, PathError};
pub use prefix_set::{PrefixSet, PrefixSetBuilder};
