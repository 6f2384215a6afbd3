//! Ethernet MAC addresses.
//!
//! Hosts get a MAC derived from their primary IPv4 address, routers never get
//! one: routes towards an adjacent router use [`ROUTER_NEXT_HOP_MAC`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Destination MAC written for every route whose next hop is another router.
pub const ROUTER_NEXT_HOP_MAC: MacAddress = MacAddress([0x08, 0x00, 0x00, 0x00, 0x00, 0x00]);

/// 48-bit MAC address, printed as `aa:bb:cc:dd:ee:ff`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MacAddress([u8; 6]);

/// Error type for MAC address parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid MAC address: {0:?}")]
pub struct ParseMacAddressError(String);

impl MacAddress {
    /// Deterministic host MAC: `08:00` followed by the four octets of `addr`.
    pub fn for_host(addr: Ipv4Addr) -> Self {
        let [a, b, c, d] = addr.octets();
        MacAddress([0x08, 0x00, a, b, c, d])
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseMacAddressError;

    /// Accepts colon- or hyphen-separated hex octets.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMacAddressError(s.to_string());
        let separator = if s.contains(':') { ':' } else { '-' };
        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 6 {
            return Err(err());
        }

        let mut bytes = [0u8; 6];
        for (byte, part) in bytes.iter_mut().zip(parts) {
            if part.is_empty() || part.len() > 2 {
                return Err(err());
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| err())?;
        }
        Ok(MacAddress(bytes))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
