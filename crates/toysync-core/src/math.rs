//! Math primitives for toysync
//!
//! Drift detection compares fields with exact equality, so every type here
//! derives bitwise-exact `PartialEq` on its stored representation. The
//! rotation that travels on the wire is `CompressedQuat`, a reduced-precision
//! quantization; comparing quantized values means sub-quantum jitter on the
//! live object never produces a dirty transition for rotation.

use std::fmt;

/// 3-component float vector (position, scale)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }
}

/// Full-precision quaternion (live object rotation)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    #[inline]
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Quat { x, y, z, w }
    }

    /// Normalize to unit length; identity if degenerate
    pub fn normalized(self) -> Quat {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len <= f32::EPSILON {
            return Quat::IDENTITY;
        }
        Quat {
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
            w: self.w / len,
        }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Quat::IDENTITY
    }
}

/// Quantization scale for compressed quaternion components
const QUAT_SCALE: f32 = i16::MAX as f32;

/// Reduced-precision quaternion - 4 components quantized to i16
///
/// This is the wire representation of rotation. Equality is on the
/// quantized values, matching what a subscriber actually received.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressedQuat([i16; 4]);

impl CompressedQuat {
    pub const IDENTITY: CompressedQuat = CompressedQuat([0, 0, 0, i16::MAX]);

    /// Quantize a full-precision quaternion
    pub fn from_quat(q: Quat) -> Self {
        let n = q.normalized();
        CompressedQuat([
            (n.x * QUAT_SCALE).round() as i16,
            (n.y * QUAT_SCALE).round() as i16,
            (n.z * QUAT_SCALE).round() as i16,
            (n.w * QUAT_SCALE).round() as i16,
        ])
    }

    /// Dequantize back to a full-precision quaternion.
    ///
    /// The result is within one quantization step of unit length; renderers
    /// that need an exact unit quaternion normalize on their side. Drift
    /// detection never calls this - it compares quantized values directly.
    pub fn to_quat(self) -> Quat {
        Quat {
            x: self.0[0] as f32 / QUAT_SCALE,
            y: self.0[1] as f32 / QUAT_SCALE,
            z: self.0[2] as f32 / QUAT_SCALE,
            w: self.0[3] as f32 / QUAT_SCALE,
        }
    }

    #[inline]
    pub fn components(self) -> [i16; 4] {
        self.0
    }

    #[inline]
    pub fn from_components(c: [i16; 4]) -> Self {
        CompressedQuat(c)
    }
}

impl Default for CompressedQuat {
    fn default() -> Self {
        CompressedQuat::IDENTITY
    }
}

impl fmt::Debug for CompressedQuat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CQuat({}, {}, {}, {})", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl From<Quat> for CompressedQuat {
    fn from(q: Quat) -> Self {
        CompressedQuat::from_quat(q)
    }
}

/// RGBA color, 4×f32
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    /// Fallback when a primitive has no color source
    pub const MAGENTA: Color = Color { r: 1.0, g: 0.0, b: 1.0, a: 1.0 };

    #[inline]
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_quat_identity() {
        let c = CompressedQuat::from_quat(Quat::IDENTITY);
        assert_eq!(c, CompressedQuat::IDENTITY);
        let q = c.to_quat();
        assert!((q.w - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_compressed_quat_precision() {
        let q = Quat::new(0.1, 0.2, 0.3, 0.9).normalized();
        let back = CompressedQuat::from_quat(q).to_quat();
        for (a, b) in [(q.x, back.x), (q.y, back.y), (q.z, back.z), (q.w, back.w)] {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn test_degenerate_quat_normalizes_to_identity() {
        let q = Quat::new(0.0, 0.0, 0.0, 0.0).normalized();
        assert_eq!(q, Quat::IDENTITY);
    }
}
