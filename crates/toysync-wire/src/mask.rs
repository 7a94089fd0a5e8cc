//! Field bitmask for delta patches
//!
//! Bit i is set iff field i is carried by the patch. The low bits are the
//! base transform fields shared by every kind; each kind claims its own
//! bits above them (see `layout`).

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask of changed fields (1 bit per field)
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldMask(pub u64);

impl FieldMask {
    pub const NONE: FieldMask = FieldMask(0);

    // Base transform fields
    pub const POSITION: u64 = 1 << 0;
    pub const ROTATION: u64 = 1 << 1;
    pub const SCALE: u64 = 1 << 2;

    // Light fields
    pub const LIGHT_INTENSITY: u64 = 1 << 4;
    pub const LIGHT_RANGE: u64 = 1 << 5;
    pub const LIGHT_COLOR: u64 = 1 << 6;
    pub const LIGHT_SHADOWS: u64 = 1 << 7;

    // Primitive fields
    pub const PRIMITIVE_COLOR: u64 = 1 << 5;

    /// All base transform bits
    pub const TRANSFORM: FieldMask =
        FieldMask(Self::POSITION | Self::ROTATION | Self::SCALE);

    #[inline]
    pub fn new(bits: u64) -> Self {
        FieldMask(bits)
    }

    #[inline]
    pub fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn contains(self, bit: u64) -> bool {
        self.0 & bit != 0
    }

    #[inline]
    pub fn insert(&mut self, bit: u64) {
        self.0 |= bit;
    }

    #[inline]
    pub fn remove(&mut self, bit: u64) {
        self.0 &= !bit;
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Restrict to the bits also present in `other`
    #[inline]
    pub fn intersect(self, other: FieldMask) -> FieldMask {
        FieldMask(self.0 & other.0)
    }

    /// Number of fields carried
    #[inline]
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl BitOr for FieldMask {
    type Output = FieldMask;

    fn bitor(self, rhs: FieldMask) -> FieldMask {
        FieldMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for FieldMask {
    fn bitor_assign(&mut self, rhs: FieldMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldMask({:#010b})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_basic_ops() {
        let mut mask = FieldMask::NONE;
        assert!(mask.is_empty());

        mask.insert(FieldMask::POSITION);
        mask.insert(FieldMask::LIGHT_RANGE);
        assert!(mask.contains(FieldMask::POSITION));
        assert!(mask.contains(FieldMask::LIGHT_RANGE));
        assert!(!mask.contains(FieldMask::SCALE));
        assert_eq!(mask.count(), 2);

        mask.remove(FieldMask::POSITION);
        assert!(!mask.contains(FieldMask::POSITION));
    }

    #[test]
    fn test_mask_intersect() {
        let a = FieldMask::new(FieldMask::POSITION | FieldMask::ROTATION);
        let b = FieldMask::TRANSFORM;
        assert_eq!(a.intersect(b), a);
        assert_eq!(a.intersect(FieldMask::NONE), FieldMask::NONE);
    }
}
