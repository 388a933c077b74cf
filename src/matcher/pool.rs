//! Prefix-pool matchers: configured subnets and country databases.

use std::net::IpAddr;

use ipnet::IpNet;

use crate::ipset::{CountrySource, GeoError, PrefixSet, PrefixSetBuilder};
use crate::lifecycle::shutdown::ShutdownSignal;

/// Matches addresses against a fixed [`PrefixSet`].
///
/// When a shutdown signal is attached, a triggered signal turns every lookup
/// into a non-match.
#[derive(Debug, Clone)]
pub struct PoolMatcher {
    name: &'static str,
    pool: PrefixSet,
    cancel: Option<ShutdownSignal>,
}

impl PoolMatcher {
    pub const DEFINED: &'static str = "defined";
    pub const GEODB: &'static str = "geodb";

    pub fn new(name: &'static str, pool: PrefixSet) -> Self {
        Self {
            name,
            pool,
            cancel: None,
        }
    }

    /// Build from configured literals.
    ///
    /// Each entry is tried as a CIDR, then as a bare address promoted to a
    /// host prefix. Entries that are neither are dropped with a warning.
    pub fn defined<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut builder = PrefixSetBuilder::new();

        for entry in entries {
            let entry = entry.as_ref().trim();
            if let Ok(net) = entry.parse::<IpNet>() {
                builder.add_prefix(net);
            } else if let Ok(addr) = entry.parse::<IpAddr>() {
                builder.add_addr(addr);
            } else {
                tracing::warn!(entry = %entry, "Ignoring invalid defined subnet");
            }
        }

        Self::new(Self::DEFINED, builder.build())
    }

    /// Build from a country source. I/O failures of the source are returned.
    pub fn geodb<C: CountrySource + ?Sized>(source: &C, codes: &[String]) -> Result<Self, GeoError> {
        Ok(Self::new(Self::GEODB, source.resolve(codes)?))
    }

    pub fn with_cancellation(mut self, signal: ShutdownSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pool(&self) -> &PrefixSet {
        &self.pool
    }

    pub fn matches(&self, addr: IpAddr) -> bool {
        if self.cancel.as_ref().is_some_and(ShutdownSignal::is_triggered) {
            return false;
        }
        self.pool.contains(addr.to_canonical())
    }
}
