//! Client address extraction.
//!
//! # Responsibilities
//! - Determine the client address from the transport peer address
//! - Optionally consult proxy headers in a configured priority order
//! - Normalize IPv4-mapped IPv6 addresses to plain IPv4
//!
//! # Design Decisions
//! - Headers are ignored unless explicitly trusted; a client talking to the
//!   gate directly could otherwise claim any address
//! - `X-Forwarded-For` contributes only its leftmost entry
//! - Header parse failures fall through to the next source, ending at the
//!   peer address; no address at all is reported as `None`

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::http::header::{HeaderMap, HeaderName, InvalidHeaderName, FORWARDED};

pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// A header consulted for the client address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderSource {
    /// `X-Real-IP`: a single address.
    RealIp,
    /// `X-Forwarded-For`: comma-separated list, leftmost is taken.
    ForwardedFor,
    /// `Forwarded` (RFC 7239): the first usable `for=` parameter.
    Forwarded,
    /// Any other header carrying a single address.
    Custom(HeaderName),
}

impl HeaderSource {
    /// Map a configured header name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self, InvalidHeaderName> {
        let name = HeaderName::from_bytes(name.trim().as_bytes())?;
        Ok(match name.as_str() {
            X_REAL_IP => HeaderSource::RealIp,
            X_FORWARDED_FOR => HeaderSource::ForwardedFor,
            "forwarded" => HeaderSource::Forwarded,
            _ => HeaderSource::Custom(name),
        })
    }

    pub fn header_name(&self) -> HeaderName {
        match self {
            HeaderSource::RealIp => HeaderName::from_static(X_REAL_IP),
            HeaderSource::ForwardedFor => HeaderName::from_static(X_FORWARDED_FOR),
            HeaderSource::Forwarded => FORWARDED,
            HeaderSource::Custom(name) => name.clone(),
        }
    }

    fn extract(&self, headers: &HeaderMap) -> Option<IpAddr> {
        let value = headers.get(self.header_name())?.to_str().ok()?;
        match self {
            HeaderSource::RealIp | HeaderSource::Custom(_) => parse_host(value),
            HeaderSource::ForwardedFor => parse_host(value.split(',').next()?),
            HeaderSource::Forwarded => parse_forwarded(value),
        }
    }
}

/// Where an extracted address came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressSource {
    Header(HeaderName),
    Remote,
}

impl fmt::Display for AddressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSource::Header(name) => write!(f, "header:{}", name),
            AddressSource::Remote => write!(f, "remote"),
        }
    }
}

/// A canonical client address plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedAddress {
    pub addr: IpAddr,
    pub source: AddressSource,
}

/// Resolves the client address of a request.
#[derive(Debug, Clone)]
pub struct IpExtractor {
    trust_headers: bool,
    headers: Vec<HeaderSource>,
}

impl IpExtractor {
    pub fn new(trust_headers: bool, headers: Vec<HeaderSource>) -> Self {
        Self {
            trust_headers,
            headers,
        }
    }

    /// Peer address only; all headers ignored.
    pub fn direct() -> Self {
        Self::new(false, Vec::new())
    }

    /// Build from configured header names.
    pub fn from_names<S: AsRef<str>>(trust_headers: bool, names: &[S]) -> Result<Self, InvalidHeaderName> {
        let headers = names
            .iter()
            .map(|n| HeaderSource::from_name(n.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(trust_headers, headers))
    }

    pub fn trusts_headers(&self) -> bool {
        self.trust_headers
    }

    /// Extract the client address, or `None` if nothing usable is present.
    pub fn extract(&self, headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<ExtractedAddress> {
        if self.trust_headers {
            for source in &self.headers {
                if let Some(addr) = source.extract(headers) {
                    return Some(ExtractedAddress {
                        addr: addr.to_canonical(),
                        source: AddressSource::Header(source.header_name()),
                    });
                }
            }
        }

        remote.map(|peer| ExtractedAddress {
            addr: peer.ip().to_canonical(),
            source: AddressSource::Remote,
        })
    }
}

impl Default for IpExtractor {
    fn default() -> Self {
        Self::direct()
    }
}

/// Parse `addr`, `[v6]`, `[v6]:port` or `v4:port`.
fn parse_host(value: &str) -> Option<IpAddr> {
    let value = value.trim();
    if let Ok(addr) = value.parse::<IpAddr>() {
        return Some(addr);
    }
    if let Some(rest) = value.strip_prefix('[') {
        let (inner, _) = rest.split_once(']')?;
        return inner.parse().ok();
    }
    value.parse::<SocketAddr>().ok().map(|s| s.ip())
}

/// First parsable `for=` value of an RFC 7239 header.
fn parse_forwarded(value: &str) -> Option<IpAddr> {
    value
        .split(',')
        .flat_map(|element| element.split(';'))
        .filter_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            key.trim().eq_ignore_ascii_case("for").then_some(val)
        })
        .find_map(|val| parse_host(val.trim().trim_matches('"')))
}
