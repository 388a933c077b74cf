//! Ordered OR-chain of match providers.

use std::net::IpAddr;

use crate::config::FilterConfig;
use crate::ipset::{GeoError, GeoResolver};
use crate::lifecycle::shutdown::Shutdown;
use crate::matcher::{MatchProvider, PoolMatcher, PrivateMatcher};

/// Allow decision over an ordered list of providers.
///
/// An address is allowed as soon as one provider matches. An empty chain
/// allows nothing.
#[derive(Debug, Clone, Default)]
pub struct FilterChain {
    providers: Vec<MatchProvider>,
}

impl FilterChain {
    pub fn new(providers: Vec<MatchProvider>) -> Self {
        Self { providers }
    }

    /// Build the providers described by `config`, cheapest first.
    ///
    /// Pool providers observe `shutdown` and stop matching once it fires.
    /// Geo table I/O errors abort construction.
    pub fn from_config(config: &FilterConfig, shutdown: &Shutdown) -> Result<Self, GeoError> {
        let mut providers = Vec::new();

        if config.allow_private {
            providers.push(MatchProvider::Private(PrivateMatcher::new()));
        }

        if !config.defined.is_empty() {
            let defined = PoolMatcher::defined(&config.defined).with_cancellation(shutdown.subscribe());
            providers.push(MatchProvider::Defined(defined));
        }

        if !config.tags.is_empty() {
            let code_file = config.code_file.as_deref().unwrap_or_default();
            let resolver = GeoResolver::from_paths(code_file, &config.geo_files)?;
            let geodb = PoolMatcher::geodb(&resolver, &config.tags)?.with_cancellation(shutdown.subscribe());
            providers.push(MatchProvider::GeoDb(geodb));
        }

        let chain = Self::new(providers);
        for provider in chain.providers() {
            tracing::info!(
                provider = provider.provider(),
                prefixes = provider.prefix_count(),
                "Matcher included"
            );
        }
        if chain.is_empty() {
            tracing::warn!("No matchers configured; every request will be denied");
        }

        Ok(chain)
    }

    /// Name of the first provider matching `addr`, if any.
    ///
    /// IPv4-mapped IPv6 addresses are matched as IPv4.
    pub fn decide(&self, addr: IpAddr) -> Option<&'static str> {
        let addr = addr.to_canonical();
        self.providers
            .iter()
            .find(|p| p.matches(addr))
            .map(MatchProvider::provider)
    }

    pub fn is_allowed(&self, addr: IpAddr) -> bool {
        self.decide(addr).is_some()
    }

    pub fn providers(&self) -> &[MatchProvider] {
        &self.providers
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(MatchProvider::provider).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
