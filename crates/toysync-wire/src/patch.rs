//! The patch message
//!
//! A patch addresses one toy on one subscriber connection. The payload is
//! already serialized in ascending bit order by the delta encoder; this
//! module only frames it with the toy id and the mask.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use toysync_core::{SyncError, SyncResult, ToyId};

use crate::{FieldLayout, FieldMask};

/// A delta patch for one toy
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
    pub toy: ToyId,
    pub mask: FieldMask,
    pub payload: Bytes,
}

impl Patch {
    pub fn new(toy: ToyId, mask: FieldMask, payload: Bytes) -> Self {
        Patch { toy, mask, payload }
    }

    /// A valid no-op patch (empty mask, no field bytes)
    pub fn empty(toy: ToyId) -> Self {
        Patch {
            toy,
            mask: FieldMask::NONE,
            payload: Bytes::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Serialize: `[toy id][mask: layout width LE][payload]`
    pub fn to_bytes(&self, layout: &FieldLayout) -> Vec<u8> {
        let width = layout.mask_width();
        let mut buf = BytesMut::with_capacity(8 + width + self.payload.len());
        buf.put_u64_le(self.toy.0);
        buf.put_slice(&self.mask.bits().to_le_bytes()[..width]);
        buf.put_slice(&self.payload);
        buf.to_vec()
    }

    /// Parse a patch framed for the given layout
    pub fn parse(bytes: &[u8], layout: &FieldLayout) -> SyncResult<Patch> {
        let width = layout.mask_width();
        let header = 8 + width;
        if bytes.len() < header {
            return Err(SyncError::BufferTooShort {
                expected: header,
                actual: bytes.len(),
            });
        }

        let mut buf = bytes;
        let toy = ToyId::new(buf.get_u64_le());

        let mut mask_bytes = [0u8; 8];
        mask_bytes[..width].copy_from_slice(&buf[..width]);
        buf.advance(width);
        let mask = FieldMask::new(u64::from_le_bytes(mask_bytes));

        // Unknown bits and truncated payloads are both framing errors.
        let expected = layout.payload_size(mask)?;
        if buf.remaining() != expected {
            return Err(SyncError::BufferTooShort {
                expected,
                actual: buf.remaining(),
            });
        }

        Ok(Patch {
            toy,
            mask,
            payload: Bytes::copy_from_slice(buf),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use toysync_core::{ToyKind, Vec3};

    use crate::codec::put_vec3;

    #[test]
    fn test_empty_patch_roundtrip() {
        let layout = FieldLayout::for_kind(ToyKind::Generic);
        let patch = Patch::empty(ToyId::new(9));
        let bytes = patch.to_bytes(&layout);
        assert_eq!(bytes.len(), 8 + 1);

        let parsed = Patch::parse(&bytes, &layout).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.toy, ToyId::new(9));
    }

    #[test]
    fn test_patch_roundtrip_with_payload() {
        let layout = FieldLayout::for_kind(ToyKind::Generic);
        let mut payload = BytesMut::new();
        put_vec3(&mut payload, Vec3::new(1.0, 2.0, 3.0));

        let patch = Patch::new(
            ToyId::new(3),
            FieldMask::new(FieldMask::POSITION),
            payload.freeze(),
        );
        let parsed = Patch::parse(&patch.to_bytes(&layout), &layout).unwrap();
        assert_eq!(parsed, patch);
    }

    #[test]
    fn test_parse_rejects_truncated_payload() {
        let layout = FieldLayout::for_kind(ToyKind::Generic);
        let mut payload = BytesMut::new();
        put_vec3(&mut payload, Vec3::ONE);
        let patch = Patch::new(
            ToyId::new(3),
            FieldMask::new(FieldMask::POSITION),
            payload.freeze(),
        );

        let mut bytes = patch.to_bytes(&layout);
        bytes.truncate(bytes.len() - 4);
        assert!(Patch::parse(&bytes, &layout).is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Framing must tolerate every legal mask of the widest layout,
            // including the empty one.
            #[test]
            fn prop_light_framing_roundtrip(bits in 0u64..256) {
                let layout = FieldLayout::for_kind(ToyKind::Light);
                let mask = FieldMask::new(bits & layout.full_mask().bits());
                let size = layout.payload_size(mask).unwrap();

                let patch = Patch::new(
                    ToyId::new(77),
                    mask,
                    Bytes::from(vec![0xAB; size]),
                );
                let parsed = Patch::parse(&patch.to_bytes(&layout), &layout).unwrap();
                prop_assert_eq!(parsed, patch);
            }
        }
    }

    #[test]
    fn test_parse_rejects_unknown_bit() {
        let layout = FieldLayout::for_kind(ToyKind::Generic);
        // Bit 7 is not part of the generic layout.
        let bytes = [
            1, 0, 0, 0, 0, 0, 0, 0, // toy id
            0b1000_0000, // mask
        ];
        assert!(matches!(
            Patch::parse(&bytes, &layout),
            Err(SyncError::UnknownFieldBit(7))
        ));
    }
}
