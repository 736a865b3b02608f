//! CIDR whitelist for callers exempt from maintenance interception.
//!
//! Ranges are parsed once when the gate is built. A malformed entry fails
//! construction; it is never skipped.
//!
//! # Matching
//!
//! - Ranges are checked in configuration order and the first containing range
//!   wins. Overlapping ranges are fine.
//! - IPv4-mapped IPv6 addresses (`::ffff:10.0.0.1`) match IPv4 ranges, and
//!   mapped ranges of `/96` or narrower (`::ffff:10.0.0.0/104`) are stored as
//!   the equivalent IPv4 range (`10.0.0.0/8`).
//! - A client value carrying a port (`10.0.0.1:443`, `[::1]:8080`) is matched
//!   on its address part.
//! - Anything that does not parse as an address is never whitelisted.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use tracing::debug;

/// Reason a CIDR string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CidrError {
    /// No `/prefix` part.
    MissingPrefix,
    /// Address part is not an IPv4 or IPv6 address.
    InvalidAddress,
    /// Prefix is not a number or exceeds the address width.
    InvalidPrefix { max: u8 },
}

impl fmt::Display for CidrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CidrError::MissingPrefix => write!(f, "missing /prefix length"),
            CidrError::InvalidAddress => write!(f, "invalid network address"),
            CidrError::InvalidPrefix { max } => {
                write!(f, "prefix length must be between 0 and {max}")
            }
        }
    }
}

impl std::error::Error for CidrError {}

/// Parsed CIDR network range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidrRange {
    network: IpAddr,
    prefix_len: u8,
}

impl CidrRange {
    /// Parse CIDR notation such as `"10.0.0.0/8"` or `"2001:db8::/32"`.
    ///
    /// Host bits in the network address are ignored (`10.1.2.3/8` is `10.0.0.0/8`).
    pub fn parse(cidr: &str) -> Result<Self, CidrError> {
        let (addr, prefix) = cidr.trim().split_once('/').ok_or(CidrError::MissingPrefix)?;

        let network: IpAddr = addr.parse().map_err(|_| CidrError::InvalidAddress)?;
        let max = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| CidrError::InvalidPrefix { max })?;
        if prefix_len > max {
            return Err(CidrError::InvalidPrefix { max });
        }

        // Clients are matched in canonical form, so mapped networks must be too.
        // Below /96 the range spans more than the mapped block and stays IPv6.
        if let IpAddr::V6(v6) = network
            && prefix_len >= 96
            && let Some(v4) = v6.to_ipv4_mapped()
        {
            return Ok(Self {
                network: IpAddr::V4(v4),
                prefix_len: prefix_len - 96,
            });
        }

        Ok(Self {
            network,
            prefix_len,
        })
    }

    /// Prefix length in bits.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Check if an IP address is contained within this range.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (&self.network, ip.to_canonical()) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = if self.prefix_len == 0 {
                    0
                } else {
                    u32::MAX << (32 - self.prefix_len)
                };
                (u32::from(*net) & mask) == (u32::from(addr) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = if self.prefix_len == 0 {
                    0
                } else {
                    u128::MAX << (128 - self.prefix_len)
                };
                (u128::from(*net) & mask) == (u128::from(addr) & mask)
            }
            _ => false,
        }
    }
}

impl fmt::Display for CidrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

/// Ordered set of exempt ranges.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    ranges: Vec<CidrRange>,
}

impl Whitelist {
    /// Parse every entry, failing on the first malformed one.
    ///
    /// The error carries the offending entry alongside the reason.
    pub fn from_cidrs<S: AsRef<str>>(cidrs: &[S]) -> Result<Self, (String, CidrError)> {
        let ranges = cidrs
            .iter()
            .map(|cidr| {
                let cidr = cidr.as_ref();
                CidrRange::parse(cidr).map_err(|e| (cidr.to_string(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { ranges })
    }

    /// Whether any range is configured.
    pub fn is_enabled(&self) -> bool {
        !self.ranges.is_empty()
    }

    /// Number of configured ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Whether no ranges are configured.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Check a resolved client address against the configured ranges.
    pub fn is_whitelisted(&self, client_ip: &str) -> bool {
        let Some(ip) = parse_client_addr(client_ip) else {
            debug!(client_ip = %client_ip, "Client address is not an IP, not whitelisted");
            return false;
        };

        match self.ranges.iter().find(|range| range.contains(&ip)) {
            Some(range) => {
                debug!(client_ip = %ip, range = %range, "Client matched whitelist range");
                true
            }
            None => false,
        }
    }
}

/// Parse a bare address, or an address with a port attached.
fn parse_client_addr(value: &str) -> Option<IpAddr> {
    let value = value.trim();
    value
        .parse::<IpAddr>()
        .ok()
        .or_else(|| value.parse::<SocketAddr>().ok().map(|sa| sa.ip()))
}
