//! Address match providers.
//!
//! # Responsibilities
//! - Private: loopback and private-range predicate, no data
//! - Defined: configured subnets and addresses
//! - GeoDb: country prefixes from a [`CountrySource`](crate::ipset::CountrySource)
//!
//! # Design Decisions
//! - Closed enum rather than trait objects: the set of variants is fixed and
//!   the chain dispatches with an exhaustive match
//! - Providers are immutable once constructed and `Send + Sync`
//! - A cancelled pool provider never matches (fail closed)

pub mod pool;
pub mod private;

use std::net::IpAddr;

use thiserror::Error;

pub use pool::PoolMatcher;
pub use private::PrivateMatcher;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid ip address: {0:?}")]
    InvalidAddress(String),
}

/// Parse a textual address into its canonical form.
pub fn parse_addr(s: &str) -> Result<IpAddr, MatchError> {
    s.trim()
        .parse::<IpAddr>()
        .map(|addr| addr.to_canonical())
        .map_err(|_| MatchError::InvalidAddress(s.to_string()))
}

/// One allow-source of the filter chain.
#[derive(Debug, Clone)]
pub enum MatchProvider {
    Private(PrivateMatcher),
    Defined(PoolMatcher),
    GeoDb(PoolMatcher),
}

impl MatchProvider {
    /// Name used in logs and metrics.
    pub fn provider(&self) -> &'static str {
        match self {
            MatchProvider::Private(_) => PrivateMatcher::NAME,
            MatchProvider::Defined(m) | MatchProvider::GeoDb(m) => m.name(),
        }
    }

    pub fn matches(&self, addr: IpAddr) -> bool {
        match self {
            MatchProvider::Private(m) => m.matches(addr),
            MatchProvider::Defined(m) | MatchProvider::GeoDb(m) => m.matches(addr),
        }
    }

    /// Parse then match. An unparsable address is an error, not a non-match.
    pub fn match_str(&self, s: &str) -> Result<bool, MatchError> {
        Ok(self.matches(parse_addr(s)?))
    }

    /// Number of canonical prefixes held, zero for predicate providers.
    pub fn prefix_count(&self) -> usize {
        match self {
            MatchProvider::Private(_) => 0,
            MatchProvider::Defined(m) | MatchProvider::GeoDb(m) => m.pool().len(),
        }
    }
}

impl From<PrivateMatcher> for MatchProvider {
    fn from(m: PrivateMatcher) -> Self {
        MatchProvider::Private(m)
    }
}
