//! The delta encoder
//!
//! Pure functions over snapshots. Given the canonical snapshot, a
//! subscriber's cached snapshot, and the instance's enabled-field mask,
//! produce the minimal patch: bit i set iff field i differs AND is
//! enabled, payload carrying exactly those fields in ascending bit order.
//! Deterministic; an empty mask yields an empty payload.

use bytes::{Bytes, BytesMut};
use toysync_core::{SyncError, SyncResult};
use toysync_wire::{codec, FieldLayout, FieldMask, Patch};

use crate::ToySnapshot;

/// Compute mask and payload for one subscriber
pub fn encode_delta(
    canonical: &ToySnapshot,
    cached: &ToySnapshot,
    enabled: FieldMask,
) -> SyncResult<(FieldMask, Bytes)> {
    let mask = canonical.diff_mask(cached)?.intersect(enabled);
    if mask.is_empty() {
        return Ok((mask, Bytes::new()));
    }
    let payload = encode_fields(canonical, mask)?;
    Ok((mask, payload))
}

/// Serialize the masked fields of a snapshot in ascending bit order
pub fn encode_fields(snapshot: &ToySnapshot, mask: FieldMask) -> SyncResult<Bytes> {
    let layout = FieldLayout::for_kind(snapshot.layout_kind());
    let mut buf = BytesMut::with_capacity(layout.payload_size(mask)?);

    for slot in layout.slots() {
        if !mask.contains(slot.bit) {
            continue;
        }
        put_field(snapshot, slot.bit, &mut buf)?;
    }

    Ok(buf.freeze())
}

/// Apply a patch to a snapshot (the dumb-renderer side, and tests)
pub fn apply_patch(snapshot: &mut ToySnapshot, patch: &Patch) -> SyncResult<()> {
    let layout = FieldLayout::for_kind(snapshot.layout_kind());
    layout.payload_size(patch.mask)?;

    let mut buf = &patch.payload[..];
    for slot in layout.slots() {
        if !patch.mask.contains(slot.bit) {
            continue;
        }
        get_field(snapshot, slot.bit, &mut buf)?;
    }

    Ok(())
}

fn put_field(snapshot: &ToySnapshot, bit: u64, buf: &mut BytesMut) -> SyncResult<()> {
    let base = snapshot.base();
    match bit {
        FieldMask::POSITION => codec::put_vec3(buf, base.position),
        FieldMask::ROTATION => codec::put_quat(buf, base.rotation),
        FieldMask::SCALE => codec::put_vec3(buf, base.scale),
        _ => match snapshot {
            ToySnapshot::Primitive { color, .. } if bit == FieldMask::PRIMITIVE_COLOR => {
                codec::put_color(buf, *color)
            }
            ToySnapshot::Light {
                color,
                intensity,
                range,
                shadows,
                ..
            } => match bit {
                FieldMask::LIGHT_INTENSITY => codec::put_f32(buf, *intensity),
                FieldMask::LIGHT_RANGE => codec::put_f32(buf, *range),
                FieldMask::LIGHT_COLOR => codec::put_color(buf, *color),
                FieldMask::LIGHT_SHADOWS => codec::put_bool(buf, *shadows),
                _ => return Err(SyncError::UnknownFieldBit(bit.trailing_zeros())),
            },
            _ => return Err(SyncError::UnknownFieldBit(bit.trailing_zeros())),
        },
    }
    Ok(())
}

fn get_field(snapshot: &mut ToySnapshot, bit: u64, buf: &mut &[u8]) -> SyncResult<()> {
    match bit {
        FieldMask::POSITION => {
            let v = codec::get_vec3(buf)?;
            snapshot.base_mut().position = v;
        }
        FieldMask::ROTATION => {
            let q = codec::get_quat(buf)?;
            snapshot.base_mut().rotation = q;
        }
        FieldMask::SCALE => {
            let v = codec::get_vec3(buf)?;
            snapshot.base_mut().scale = v;
        }
        _ => match snapshot {
            ToySnapshot::Primitive { color, .. } if bit == FieldMask::PRIMITIVE_COLOR => {
                *color = codec::get_color(buf)?;
            }
            ToySnapshot::Light {
                color,
                intensity,
                range,
                shadows,
                ..
            } => match bit {
                FieldMask::LIGHT_INTENSITY => *intensity = codec::get_f32(buf)?,
                FieldMask::LIGHT_RANGE => *range = codec::get_f32(buf)?,
                FieldMask::LIGHT_COLOR => *color = codec::get_color(buf)?,
                FieldMask::LIGHT_SHADOWS => *shadows = codec::get_bool(buf)?,
                _ => return Err(SyncError::UnknownFieldBit(bit.trailing_zeros())),
            },
            _ => return Err(SyncError::UnknownFieldBit(bit.trailing_zeros())),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toysync_core::{Color, Toy, ToyDetail, ToyId, Transform, Vec3};
    use toysync_wire::FieldMask;

    fn light_toy() -> Toy {
        Toy::new(
            ToyId::new(1),
            Transform::IDENTITY,
            ToyDetail::Light {
                color: Color::WHITE,
                intensity: 2.0,
                range: 15.0,
                shadows: false,
            },
        )
    }

    fn full_mask(snapshot: &ToySnapshot) -> FieldMask {
        FieldLayout::for_kind(snapshot.layout_kind()).full_mask()
    }

    #[test]
    fn test_noop_idempotence() {
        let toy = light_toy();
        let canonical = ToySnapshot::capture(&toy);
        let mut cached = canonical.clone();
        let enabled = full_mask(&canonical);

        let (mask, payload) = encode_delta(&canonical, &cached, enabled).unwrap();
        assert!(mask.is_empty());
        assert!(payload.is_empty());

        // Second call against the unchanged pair: still empty.
        cached.copy_fields_from(&canonical, mask).unwrap();
        let (mask, _) = encode_delta(&canonical, &cached, enabled).unwrap();
        assert!(mask.is_empty());
    }

    #[test]
    fn test_patch_minimality() {
        let mut toy = light_toy();
        let cached = ToySnapshot::capture(&toy);

        toy.transform.scale = Vec3::new(2.0, 2.0, 2.0);
        if let ToyDetail::Light { shadows, .. } = &mut toy.detail {
            *shadows = true;
        }
        let canonical = ToySnapshot::capture(&toy);

        let (mask, payload) =
            encode_delta(&canonical, &cached, full_mask(&canonical)).unwrap();
        assert_eq!(mask.bits(), FieldMask::SCALE | FieldMask::LIGHT_SHADOWS);
        assert_eq!(payload.len(), 12 + 1);
    }

    #[test]
    fn test_disabled_fields_never_encoded() {
        let mut toy = light_toy();
        let cached = ToySnapshot::capture(&toy);

        toy.transform.position = Vec3::new(3.0, 0.0, 0.0);
        if let ToyDetail::Light { range, .. } = &mut toy.detail {
            *range = 1.0;
        }
        let canonical = ToySnapshot::capture(&toy);

        // Transform sync disabled for this instance.
        let mut enabled = full_mask(&canonical);
        enabled.remove(FieldMask::POSITION);
        enabled.remove(FieldMask::ROTATION);
        enabled.remove(FieldMask::SCALE);

        let (mask, _) = encode_delta(&canonical, &cached, enabled).unwrap();
        assert_eq!(mask.bits(), FieldMask::LIGHT_RANGE);
    }

    #[test]
    fn test_convergence_via_apply() {
        let mut toy = light_toy();
        let mut cached = ToySnapshot::capture(&toy);

        toy.transform.position = Vec3::new(1.0, 2.0, 3.0);
        if let ToyDetail::Light { color, intensity, .. } = &mut toy.detail {
            *color = Color::BLACK;
            *intensity = 0.25;
        }
        let canonical = ToySnapshot::capture(&toy);

        let enabled = full_mask(&canonical);
        let (mask, payload) = encode_delta(&canonical, &cached, enabled).unwrap();
        let patch = Patch::new(toy.id, mask, payload);
        apply_patch(&mut cached, &patch).unwrap();

        assert_eq!(cached, canonical);
        let (mask, _) = encode_delta(&canonical, &cached, enabled).unwrap();
        assert!(mask.is_empty());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn arb_light_snapshot() -> impl Strategy<Value = ToySnapshot> {
            (
                (-100.0f32..100.0, -100.0f32..100.0, -100.0f32..100.0),
                0.0f32..10.0,
                0.0f32..50.0,
                any::<bool>(),
            )
                .prop_map(|((x, y, z), intensity, range, shadows)| {
                    let toy = Toy::new(
                        ToyId::new(1),
                        Transform::new(
                            Vec3::new(x, y, z),
                            toysync_core::Quat::IDENTITY,
                            Vec3::ONE,
                        ),
                        ToyDetail::Light {
                            color: Color::WHITE,
                            intensity,
                            range,
                            shadows,
                        },
                    );
                    ToySnapshot::capture(&toy)
                })
        }

        proptest! {
            #[test]
            fn prop_mask_is_exactly_the_differing_fields(
                canonical in arb_light_snapshot(),
                cached in arb_light_snapshot(),
            ) {
                let enabled = full_mask(&canonical);
                let (mask, payload) = encode_delta(&canonical, &cached, enabled).unwrap();

                prop_assert_eq!(mask, canonical.diff_mask(&cached).unwrap());
                let layout = FieldLayout::for_kind(canonical.layout_kind());
                prop_assert_eq!(payload.len(), layout.payload_size(mask).unwrap());
            }

            #[test]
            fn prop_apply_converges_in_one_patch(
                canonical in arb_light_snapshot(),
                mut cached in arb_light_snapshot(),
            ) {
                let enabled = full_mask(&canonical);
                let (mask, payload) = encode_delta(&canonical, &cached, enabled).unwrap();
                apply_patch(&mut cached, &Patch::new(ToyId::new(1), mask, payload)).unwrap();

                let (mask, _) = encode_delta(&canonical, &cached, enabled).unwrap();
                prop_assert!(mask.is_empty());
            }
        }
    }

    #[test]
    fn test_deterministic_encoding() {
        let mut toy = light_toy();
        let cached = ToySnapshot::capture(&toy);
        toy.transform.position = Vec3::new(4.0, 5.0, 6.0);
        let canonical = ToySnapshot::capture(&toy);

        let enabled = full_mask(&canonical);
        let a = encode_delta(&canonical, &cached, enabled).unwrap();
        let b = encode_delta(&canonical, &cached, enabled).unwrap();
        assert_eq!(a, b);
    }
}
