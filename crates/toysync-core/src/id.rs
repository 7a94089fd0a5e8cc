//! Identity types for toysync
//!
//! All identifiers are 64-bit for wire efficiency. They are opaque to this
//! layer: toy ids are handed out by the spawn routine, client ids by the
//! host's connection layer, region ids by the region graph.

use std::fmt;

/// Toy identity - one replicated world object
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ToyId(pub u64);

impl ToyId {
    pub const ZERO: ToyId = ToyId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        ToyId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        ToyId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for ToyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Toy({})", self.0)
    }
}

impl fmt::Display for ToyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client identity - one connected subscriber
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl ClientId {
    pub const ZERO: ClientId = ClientId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        ClientId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        ClientId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client({})", self.0)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Region identity - one spatial partition of the world
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct RegionId(pub u64);

impl RegionId {
    #[inline]
    pub fn new(id: u64) -> Self {
        RegionId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        RegionId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region({})", self.0)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let toy = ToyId::new(0xDEAD_BEEF);
        assert_eq!(ToyId::from_bytes(toy.to_bytes()), toy);

        let client = ClientId::new(42);
        assert_eq!(ClientId::from_bytes(client.to_bytes()), client);

        let region = RegionId::new(7);
        assert_eq!(RegionId::from_bytes(region.to_bytes()), region);
    }
}
