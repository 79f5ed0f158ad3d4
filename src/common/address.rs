// src/common/address.rs

use super::error::ConfigError;
use core::convert::TryFrom;
use core::fmt;
use core::str::FromStr;

/// 6-byte hardware address of the node that receives status messages.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct PeerAddress([u8; 6]);

impl PeerAddress {
    /// Receiver used by the reference deployment.
    pub const REFERENCE: PeerAddress = PeerAddress([0x8C, 0xAA, 0xB5, 0x84, 0xFB, 0x90]);
    pub const BROADCAST: PeerAddress = PeerAddress([0xFF; 6]);

    /// Creates a `PeerAddress`, rejecting group (multicast/broadcast) addresses.
    pub fn new(octets: [u8; 6]) -> Result<Self, ConfigError> {
        let addr = PeerAddress(octets);
        if addr.is_unicast() {
            Ok(addr)
        } else {
            Err(ConfigError::MulticastPeer)
        }
    }

    #[inline]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// The group bit is the least significant bit of the first octet.
    #[inline]
    pub const fn is_unicast(&self) -> bool {
        self.0[0] & 0x01 == 0
    }
}

impl Default for PeerAddress {
    fn default() -> Self {
        Self::REFERENCE
    }
}

impl TryFrom<[u8; 6]> for PeerAddress {
    type Error = ConfigError;

    fn try_from(value: [u8; 6]) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PeerAddress> for [u8; 6] {
    fn from(value: PeerAddress) -> Self {
        value.0
    }
}

/// Parses `8C:AA:B5:84:FB:90` or `8c-aa-b5-84-fb-90`.
impl FromStr for PeerAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sep = if s.contains('-') { '-' } else { ':' };
        let mut octets = [0u8; 6];
        let mut parts = s.trim().split(sep);

        for octet in octets.iter_mut() {
            let part = parts.next().ok_or(ConfigError::InvalidPeerAddress)?;
            // from_str_radix alone would let a leading sign through.
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ConfigError::InvalidPeerAddress);
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| ConfigError::InvalidPeerAddress)?;
        }
        if parts.next().is_some() {
            return Err(ConfigError::InvalidPeerAddress);
        }

        Self::new(octets)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}
