//! The toy data model
//!
//! A toy is a server-authoritative world object whose mutable state is
//! replicated to subscribed clients. Toys are created by the spawn routine,
//! owned by exactly one synchronizer, and destroyed externally (despawn
//! detaches the synchronizer from its controller first).

use crate::{Color, CompressedQuat, Quat, ToyId, Vec3};

/// Spatial state shared by every toy kind
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Transform { position, rotation, scale }
    }

    /// Rotation as it travels on the wire
    #[inline]
    pub fn wire_rotation(&self) -> CompressedQuat {
        CompressedQuat::from_quat(self.rotation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

/// Primitive mesh shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveShape {
    Sphere,
    Capsule,
    Cylinder,
    Cube,
    Plane,
    Quad,
}

/// Shooting target variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Sport,
    Binary,
    ClassD,
}

/// Kind-specific fields of a toy
#[derive(Clone, Debug, PartialEq)]
pub enum ToyDetail {
    /// Transform-only object
    None,
    /// Visible mesh primitive; invisible-by-default to non-subscribers
    Primitive {
        shape: PrimitiveShape,
        color: Color,
        collision: bool,
    },
    /// Point light with photometric properties
    Light {
        color: Color,
        intensity: f32,
        range: f32,
        shadows: bool,
    },
    /// Shooting target; transform sync only
    Target { kind: TargetKind },
}

/// Discriminant of `ToyDetail`, used for schema checks and field layouts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToyKind {
    Generic,
    Primitive,
    Light,
    Target,
}

impl ToyKind {
    pub fn name(self) -> &'static str {
        match self {
            ToyKind::Generic => "generic",
            ToyKind::Primitive => "primitive",
            ToyKind::Light => "light",
            ToyKind::Target => "target",
        }
    }
}

/// A server-authoritative world object
#[derive(Clone, Debug, PartialEq)]
pub struct Toy {
    pub id: ToyId,
    pub transform: Transform,
    pub detail: ToyDetail,
}

impl Toy {
    pub fn new(id: ToyId, transform: Transform, detail: ToyDetail) -> Self {
        Toy { id, transform, detail }
    }

    pub fn kind(&self) -> ToyKind {
        match self.detail {
            ToyDetail::None => ToyKind::Generic,
            ToyDetail::Primitive { .. } => ToyKind::Primitive,
            ToyDetail::Light { .. } => ToyKind::Light,
            ToyDetail::Target { .. } => ToyKind::Target,
        }
    }
}
