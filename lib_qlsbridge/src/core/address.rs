//! # Server Addresses
//!
//! Validated IPv4 `ip:port` pairs identifying one upstream game server, and the
//! resolver that turns caller-supplied strings into them.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

/// Why a raw address string could not become a [`ServerAddress`].
#[derive(Debug, Error)]
pub enum AddressError {
    /// Not of the form `ipv4:port`.
    #[error("invalid server address '{0}'")]
    Syntax(String),

    /// DNS lookup failed.
    #[error("failed to resolve '{input}': {source}")]
    Lookup {
        input: String,
        #[source]
        source: std::io::Error,
    },

    /// The name resolved, but not to any IPv4 address.
    #[error("'{0}' has no IPv4 address")]
    NoIpv4(String),
}

/// A validated `(ip, port)` pair. Displays as `ip:port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerAddress(SocketAddrV4);

impl ServerAddress {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        Self(SocketAddrV4::new(ip, port))
    }

    pub fn ip(&self) -> Ipv4Addr {
        *self.0.ip()
    }

    pub fn port(&self) -> u16 {
        self.0.port()
    }

    /// Parses a literal `ipv4:port` string. No DNS lookup is made.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        input
            .trim()
            .parse::<SocketAddrV4>()
            .map(Self)
            .map_err(|_| AddressError::Syntax(input.to_string()))
    }

    /// Resolves `host:port`, accepting host names as well as literal IPv4
    /// addresses. The first IPv4 result wins.
    pub async fn resolve(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        if let Ok(addr) = Self::parse(trimmed) {
            return Ok(addr);
        }
        // lookup_host accepts any "host:port"; reject obvious garbage first
        // so that a bare word never turns into a DNS query.
        let (host, port) = trimmed
            .rsplit_once(':')
            .ok_or_else(|| AddressError::Syntax(input.to_string()))?;
        if host.is_empty() || port.parse::<u16>().is_err() {
            return Err(AddressError::Syntax(input.to_string()));
        }

        let resolved = tokio::net::lookup_host(trimmed)
            .await
            .map_err(|source| AddressError::Lookup {
                input: input.to_string(),
                source,
            })?;

        resolved
            .into_iter()
            .find_map(|addr| match addr {
                SocketAddr::V4(v4) => Some(Self(v4)),
                SocketAddr::V6(_) => None,
            })
            .ok_or_else(|| AddressError::NoIpv4(input.to_string()))
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.ip(), self.0.port())
    }
}

impl FromStr for ServerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<SocketAddrV4> for ServerAddress {
    fn from(addr: SocketAddrV4) -> Self {
        Self(addr)
    }
}

/// Resolves every raw address, keeping caller order and dropping the ones
/// that fail. Duplicates are kept.
pub async fn resolve_all<S: AsRef<str>>(raw: &[S]) -> Vec<ServerAddress> {
    let mut resolved = Vec::with_capacity(raw.len());
    for input in raw {
        match ServerAddress::resolve(input.as_ref()).await {
            Ok(addr) => resolved.push(addr),
            Err(e) => debug!("Dropping server address: {}", e),
        }
    }
    resolved
}
