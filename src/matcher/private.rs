//! Private and loopback address predicate.

use std::net::{IpAddr, Ipv6Addr};

/// Matches loopback, RFC 1918 and RFC 4193 (fc00::/7) addresses.
///
/// Holds no data. IPv4-mapped IPv6 addresses are unwrapped first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivateMatcher;

impl PrivateMatcher {
    pub const NAME: &'static str = "private";

    pub fn new() -> Self {
        Self
    }

    pub fn matches(&self, addr: IpAddr) -> bool {
        match addr.to_canonical() {
            IpAddr::V4(a) => a.is_loopback() || a.is_private(),
            IpAddr::V6(a) => a.is_loopback() || is_unique_local(&a),
        }
    }
}

fn is_unique_local(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xfe00) == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(s: &str) -> bool {
        PrivateMatcher::new().matches(s.parse().unwrap())
    }

    #[test]
    fn loopback_and_private_ranges() {
        assert!(matches("127.0.0.1"));
        assert!(matches("127.255.0.1"));
        assert!(matches("::1"));
        assert!(matches("10.1.1.1"));
        assert!(matches("172.16.0.1"));
        assert!(matches("172.31.255.255"));
        assert!(matches("192.168.0.1"));
        assert!(matches("fc00::1"));
        assert!(matches("fdab:1234::1"));
        assert!(matches("::ffff:192.168.1.1"));
    }

    #[test]
    fn public_addresses() {
        assert!(!matches("8.8.8.8"));
        assert!(!matches("172.32.0.1"));
        assert!(!matches("192.169.0.1"));
        assert!(!matches("fe80::1"));
        assert!(!matches("2001:db8::1"));
        assert!(!matches("::ffff:8.8.8.8"));
    }
}
