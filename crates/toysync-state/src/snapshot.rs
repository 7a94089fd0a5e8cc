//! Snapshots of a toy's synchronizable fields
//!
//! A snapshot is a plain record, no behavior beyond field access and
//! per-field copying. The synchronizer keeps one canonical snapshot (its
//! current belief about the toy) and one cached snapshot per subscriber
//! (what that subscriber last received). Rotation is stored in its wire
//! representation so equality means "the subscriber would render this
//! exact rotation".

use toysync_core::{
    Color, CompressedQuat, SyncError, SyncResult, Toy, ToyDetail, ToyKind, Vec3,
};
use toysync_wire::FieldMask;

/// Base transform fields shared by every kind
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformSnapshot {
    pub position: Vec3,
    pub rotation: CompressedQuat,
    pub scale: Vec3,
}

impl TransformSnapshot {
    pub fn capture(toy: &Toy) -> Self {
        TransformSnapshot {
            position: toy.transform.position,
            rotation: toy.transform.wire_rotation(),
            scale: toy.transform.scale,
        }
    }
}

/// Snapshot of one toy, schema fixed by the toy's kind
#[derive(Clone, Debug, PartialEq)]
pub enum ToySnapshot {
    /// Generic and target toys: transform only
    Transform(TransformSnapshot),
    Primitive {
        base: TransformSnapshot,
        color: Color,
    },
    Light {
        base: TransformSnapshot,
        color: Color,
        intensity: f32,
        range: f32,
        shadows: bool,
    },
}

impl ToySnapshot {
    /// Capture the toy's current authoritative state
    pub fn capture(toy: &Toy) -> Self {
        let base = TransformSnapshot::capture(toy);
        match toy.detail {
            ToyDetail::None | ToyDetail::Target { .. } => ToySnapshot::Transform(base),
            ToyDetail::Primitive { color, .. } => ToySnapshot::Primitive { base, color },
            ToyDetail::Light {
                color,
                intensity,
                range,
                shadows,
            } => ToySnapshot::Light {
                base,
                color,
                intensity,
                range,
                shadows,
            },
        }
    }

    pub fn schema_name(&self) -> &'static str {
        match self {
            ToySnapshot::Transform(_) => "transform",
            ToySnapshot::Primitive { .. } => "primitive",
            ToySnapshot::Light { .. } => "light",
        }
    }

    /// Layout kind this snapshot serializes under
    pub fn layout_kind(&self) -> ToyKind {
        match self {
            ToySnapshot::Transform(_) => ToyKind::Generic,
            ToySnapshot::Primitive { .. } => ToyKind::Primitive,
            ToySnapshot::Light { .. } => ToyKind::Light,
        }
    }

    pub fn base(&self) -> &TransformSnapshot {
        match self {
            ToySnapshot::Transform(base) => base,
            ToySnapshot::Primitive { base, .. } => base,
            ToySnapshot::Light { base, .. } => base,
        }
    }

    /// Mask of every field that differs from `other` (exact equality)
    pub fn diff_mask(&self, other: &ToySnapshot) -> SyncResult<FieldMask> {
        let mut mask = FieldMask::NONE;

        let (a, b) = (self.base(), other.base());
        if a.position != b.position {
            mask.insert(FieldMask::POSITION);
        }
        if a.rotation != b.rotation {
            mask.insert(FieldMask::ROTATION);
        }
        if a.scale != b.scale {
            mask.insert(FieldMask::SCALE);
        }

        match (self, other) {
            (ToySnapshot::Transform(_), ToySnapshot::Transform(_)) => {}
            (
                ToySnapshot::Primitive { color: ca, .. },
                ToySnapshot::Primitive { color: cb, .. },
            ) => {
                if ca != cb {
                    mask.insert(FieldMask::PRIMITIVE_COLOR);
                }
            }
            (
                ToySnapshot::Light {
                    color: ca,
                    intensity: ia,
                    range: ra,
                    shadows: sa,
                    ..
                },
                ToySnapshot::Light {
                    color: cb,
                    intensity: ib,
                    range: rb,
                    shadows: sb,
                    ..
                },
            ) => {
                if ia != ib {
                    mask.insert(FieldMask::LIGHT_INTENSITY);
                }
                if ra != rb {
                    mask.insert(FieldMask::LIGHT_RANGE);
                }
                if ca != cb {
                    mask.insert(FieldMask::LIGHT_COLOR);
                }
                if sa != sb {
                    mask.insert(FieldMask::LIGHT_SHADOWS);
                }
            }
            _ => {
                return Err(SyncError::SchemaMismatch {
                    expected: self.schema_name(),
                    got: other.schema_name(),
                })
            }
        }

        Ok(mask)
    }

    /// Copy only the fields named by `mask` from `other` into self.
    ///
    /// This is the post-send cache update: a partial sync must never touch
    /// fields it did not send.
    pub fn copy_fields_from(&mut self, other: &ToySnapshot, mask: FieldMask) -> SyncResult<()> {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return Err(SyncError::SchemaMismatch {
                expected: self.schema_name(),
                got: other.schema_name(),
            });
        }

        {
            let src = *other.base();
            let dst = self.base_mut();
            if mask.contains(FieldMask::POSITION) {
                dst.position = src.position;
            }
            if mask.contains(FieldMask::ROTATION) {
                dst.rotation = src.rotation;
            }
            if mask.contains(FieldMask::SCALE) {
                dst.scale = src.scale;
            }
        }

        match (self, other) {
            (ToySnapshot::Transform(_), ToySnapshot::Transform(_)) => {}
            (
                ToySnapshot::Primitive { color, .. },
                ToySnapshot::Primitive { color: src, .. },
            ) => {
                if mask.contains(FieldMask::PRIMITIVE_COLOR) {
                    *color = *src;
                }
            }
            (
                ToySnapshot::Light {
                    color,
                    intensity,
                    range,
                    shadows,
                    ..
                },
                ToySnapshot::Light {
                    color: c,
                    intensity: i,
                    range: r,
                    shadows: s,
                    ..
                },
            ) => {
                if mask.contains(FieldMask::LIGHT_INTENSITY) {
                    *intensity = *i;
                }
                if mask.contains(FieldMask::LIGHT_RANGE) {
                    *range = *r;
                }
                if mask.contains(FieldMask::LIGHT_COLOR) {
                    *color = *c;
                }
                if mask.contains(FieldMask::LIGHT_SHADOWS) {
                    *shadows = *s;
                }
            }
            _ => unreachable!("discriminants checked above"),
        }

        Ok(())
    }

    pub(crate) fn base_mut(&mut self) -> &mut TransformSnapshot {
        match self {
            ToySnapshot::Transform(base) => base,
            ToySnapshot::Primitive { base, .. } => base,
            ToySnapshot::Light { base, .. } => base,
        }
    }
}
