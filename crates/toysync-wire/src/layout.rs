//! Per-kind field layout tables
//!
//! Each concrete toy kind declares one flat table of (bit, encoding) slots
//! in ascending bit order. The table drives payload serialization order,
//! payload sizing during parse, and the wire width of the mask. `verify`
//! rejects layouts where two slots share a bit, so an extension can never
//! silently collide with its base fields.

use toysync_core::{SyncError, SyncResult, ToyKind};

use crate::FieldMask;

/// Wire encoding of a single field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldEncoding {
    /// 3×f32 LE (12 bytes)
    Vec3,
    /// 4×i16 LE reduced-precision quaternion (8 bytes)
    QuatCompressed,
    /// f32 LE (4 bytes)
    F32,
    /// 1 byte, 0 or 1
    Bool,
    /// 4×f32 LE RGBA (16 bytes)
    Color,
}

impl FieldEncoding {
    /// Serialized size in bytes
    pub fn size(self) -> usize {
        match self {
            FieldEncoding::Vec3 => 12,
            FieldEncoding::QuatCompressed => 8,
            FieldEncoding::F32 => 4,
            FieldEncoding::Bool => 1,
            FieldEncoding::Color => 16,
        }
    }
}

/// One field slot in a kind's layout
#[derive(Clone, Copy, Debug)]
pub struct FieldSlot {
    pub bit: u64,
    pub encoding: FieldEncoding,
}

const fn slot(bit: u64, encoding: FieldEncoding) -> FieldSlot {
    FieldSlot { bit, encoding }
}

const TRANSFORM_SLOTS: [FieldSlot; 3] = [
    slot(FieldMask::POSITION, FieldEncoding::Vec3),
    slot(FieldMask::ROTATION, FieldEncoding::QuatCompressed),
    slot(FieldMask::SCALE, FieldEncoding::Vec3),
];

const PRIMITIVE_SLOTS: [FieldSlot; 4] = [
    slot(FieldMask::POSITION, FieldEncoding::Vec3),
    slot(FieldMask::ROTATION, FieldEncoding::QuatCompressed),
    slot(FieldMask::SCALE, FieldEncoding::Vec3),
    slot(FieldMask::PRIMITIVE_COLOR, FieldEncoding::Color),
];

const LIGHT_SLOTS: [FieldSlot; 7] = [
    slot(FieldMask::POSITION, FieldEncoding::Vec3),
    slot(FieldMask::ROTATION, FieldEncoding::QuatCompressed),
    slot(FieldMask::SCALE, FieldEncoding::Vec3),
    slot(FieldMask::LIGHT_INTENSITY, FieldEncoding::F32),
    slot(FieldMask::LIGHT_RANGE, FieldEncoding::F32),
    slot(FieldMask::LIGHT_COLOR, FieldEncoding::Color),
    slot(FieldMask::LIGHT_SHADOWS, FieldEncoding::Bool),
];

/// Field layout for one concrete toy kind
#[derive(Clone, Copy, Debug)]
pub struct FieldLayout {
    kind: ToyKind,
    slots: &'static [FieldSlot],
}

impl FieldLayout {
    /// Layout for a toy kind
    pub fn for_kind(kind: ToyKind) -> FieldLayout {
        let slots: &'static [FieldSlot] = match kind {
            ToyKind::Generic | ToyKind::Target => &TRANSFORM_SLOTS,
            ToyKind::Primitive => &PRIMITIVE_SLOTS,
            ToyKind::Light => &LIGHT_SLOTS,
        };
        FieldLayout { kind, slots }
    }

    pub fn kind(&self) -> ToyKind {
        self.kind
    }

    /// Slots in ascending bit order
    pub fn slots(&self) -> &'static [FieldSlot] {
        self.slots
    }

    /// Mask of every field this kind can carry
    pub fn full_mask(&self) -> FieldMask {
        FieldMask::new(self.slots.iter().fold(0, |acc, s| acc | s.bit))
    }

    /// Wire width of the mask in bytes (grows with the highest bit)
    pub fn mask_width(&self) -> usize {
        let highest = self.slots.last().map(|s| 63 - s.bit.leading_zeros()).unwrap_or(0);
        (highest as usize / 8) + 1
    }

    /// Total payload size for a given mask
    pub fn payload_size(&self, mask: FieldMask) -> SyncResult<usize> {
        let unknown = mask.bits() & !self.full_mask().bits();
        if unknown != 0 {
            return Err(SyncError::UnknownFieldBit(unknown.trailing_zeros()));
        }
        Ok(self
            .slots
            .iter()
            .filter(|s| mask.contains(s.bit))
            .map(|s| s.encoding.size())
            .sum())
    }

    /// Check that every slot is a single distinct bit in ascending order
    pub fn verify(&self) -> SyncResult<()> {
        let mut seen: u64 = 0;
        for s in self.slots {
            // seen is the union of all lower slots; a valid next bit is a
            // single bit strictly above every one of them.
            if s.bit.count_ones() != 1 || s.bit <= seen {
                return Err(SyncError::FieldBitCollision {
                    kind: self.kind.name(),
                    bit: s.bit.trailing_zeros(),
                });
            }
            seen |= s.bit;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_layouts_verify() {
        for kind in [ToyKind::Generic, ToyKind::Primitive, ToyKind::Light, ToyKind::Target] {
            FieldLayout::for_kind(kind).verify().unwrap();
        }
    }

    #[test]
    fn test_mask_width_one_byte_for_current_kinds() {
        for kind in [ToyKind::Generic, ToyKind::Primitive, ToyKind::Light, ToyKind::Target] {
            assert_eq!(FieldLayout::for_kind(kind).mask_width(), 1);
        }
    }

    #[test]
    fn test_payload_size() {
        let light = FieldLayout::for_kind(ToyKind::Light);
        // position + intensity
        let mask = FieldMask::new(FieldMask::POSITION | FieldMask::LIGHT_INTENSITY);
        assert_eq!(light.payload_size(mask).unwrap(), 12 + 4);
        assert_eq!(light.payload_size(FieldMask::NONE).unwrap(), 0);
    }

    #[test]
    fn test_payload_size_rejects_foreign_bit() {
        let generic = FieldLayout::for_kind(ToyKind::Generic);
        let mask = FieldMask::new(FieldMask::LIGHT_SHADOWS);
        assert!(generic.payload_size(mask).is_err());
    }

    #[test]
    fn test_primitive_color_bit_distinct_from_base() {
        // Primitive color sits above the transform bits; a collision here
        // would corrupt every primitive patch.
        assert_eq!(FieldMask::PRIMITIVE_COLOR & FieldMask::TRANSFORM.bits(), 0);
        assert_eq!(FieldMask::LIGHT_INTENSITY & FieldMask::TRANSFORM.bits(), 0);
    }
}
