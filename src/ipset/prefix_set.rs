//! Canonical prefix sets.
//!
//! # Responsibilities
//! - Accumulate prefixes and host addresses from any number of sources
//! - Merge overlapping and adjacent prefixes into canonical form
//! - Answer membership queries in O(log n)
//!
//! # Design Decisions
//! - IPv4 and IPv6 are kept in separate sorted vectors; a query only ever
//!   searches the vector of its own family, so cross-family lookups are a
//!   plain non-match
//! - Canonical form is the output of `ipnet` aggregation, which makes two sets
//!   built from the same prefixes in any order compare equal

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

/// An immutable, canonical union of IP prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixSet {
    v4: Vec<Ipv4Net>,
    v6: Vec<Ipv6Net>,
}

impl PrefixSet {
    /// Start a new builder.
    pub fn builder() -> PrefixSetBuilder {
        PrefixSetBuilder::new()
    }

    /// An empty set that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if `addr` falls inside any prefix of its own family.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(a) => contains_v4(&self.v4, a),
            IpAddr::V6(a) => contains_v6(&self.v6, a),
        }
    }

    /// Number of canonical prefixes across both families.
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }

    /// Iterate canonical prefixes, IPv4 first, each family in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = IpNet> + '_ {
        self.v4
            .iter()
            .copied()
            .map(IpNet::V4)
            .chain(self.v6.iter().copied().map(IpNet::V6))
    }
}

impl FromIterator<IpNet> for PrefixSet {
    fn from_iter<T: IntoIterator<Item = IpNet>>(iter: T) -> Self {
        let mut builder = PrefixSetBuilder::new();
        builder.extend(iter);
        builder.build()
    }
}

// Sorted, non-overlapping prefixes: the only candidate is the last prefix
// whose network address is <= the queried address.
fn contains_v4(nets: &[Ipv4Net], addr: Ipv4Addr) -> bool {
    let idx = nets.partition_point(|n| n.network() <= addr);
    idx > 0 && nets[idx - 1].contains(&addr)
}

fn contains_v6(nets: &[Ipv6Net], addr: Ipv6Addr) -> bool {
    let idx = nets.partition_point(|n| n.network() <= addr);
    idx > 0 && nets[idx - 1].contains(&addr)
}

fn unmap_v4(net: Ipv6Net) -> Option<Ipv4Net> {
    let len = net.prefix_len().checked_sub(96)?;
    let addr = net.network().to_ipv4_mapped()?;
    Ipv4Net::new(addr, len).ok()
}

/// Accumulates prefixes before a single finalizing [`build`](Self::build).
#[derive(Debug, Default)]
pub struct PrefixSetBuilder {
    v4: Vec<Ipv4Net>,
    v6: Vec<Ipv6Net>,
}

impl PrefixSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a network prefix. Host bits are truncated.
    ///
    /// Prefixes inside `::ffff:0:0/96` are stored as their IPv4 equivalent.
    pub fn add_prefix(&mut self, net: IpNet) -> &mut Self {
        match net.trunc() {
            IpNet::V4(n) => self.v4.push(n),
            IpNet::V6(n) => match unmap_v4(n) {
                Some(v4) => self.v4.push(v4),
                None => self.v6.push(n),
            },
        }
        self
    }

    /// Add a single address as a host-exact prefix (/32 or /128).
    pub fn add_addr(&mut self, addr: IpAddr) -> &mut Self {
        self.add_prefix(IpNet::from(addr))
    }

    pub fn extend<I: IntoIterator<Item = IpNet>>(&mut self, nets: I) -> &mut Self {
        for net in nets {
            self.add_prefix(net);
        }
        self
    }

    /// Number of raw prefixes added so far, before merging.
    pub fn pending(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    /// Merge everything added into a canonical [`PrefixSet`].
    pub fn build(self) -> PrefixSet {
        let mut v4 = Ipv4Net::aggregate(&self.v4);
        let mut v6 = Ipv6Net::aggregate(&self.v6);
        v4.sort_unstable();
        v6.sort_unstable();
        PrefixSet { v4, v6 }
    }
}
