//! Fixed-width binary encodings for patch fields
//!
//! All multi-byte values are little-endian. Readers check remaining length
//! before touching the buffer and return `BufferTooShort` instead of
//! panicking.

use bytes::{Buf, BufMut};
use toysync_core::{Color, CompressedQuat, SyncError, SyncResult, Vec3};

fn check_remaining(buf: &impl Buf, needed: usize) -> SyncResult<()> {
    if buf.remaining() < needed {
        return Err(SyncError::BufferTooShort {
            expected: needed,
            actual: buf.remaining(),
        });
    }
    Ok(())
}

pub fn put_vec3(buf: &mut impl BufMut, v: Vec3) {
    buf.put_f32_le(v.x);
    buf.put_f32_le(v.y);
    buf.put_f32_le(v.z);
}

pub fn get_vec3(buf: &mut impl Buf) -> SyncResult<Vec3> {
    check_remaining(buf, 12)?;
    Ok(Vec3::new(buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le()))
}

pub fn put_quat(buf: &mut impl BufMut, q: CompressedQuat) {
    for c in q.components() {
        buf.put_i16_le(c);
    }
}

pub fn get_quat(buf: &mut impl Buf) -> SyncResult<CompressedQuat> {
    check_remaining(buf, 8)?;
    Ok(CompressedQuat::from_components([
        buf.get_i16_le(),
        buf.get_i16_le(),
        buf.get_i16_le(),
        buf.get_i16_le(),
    ]))
}

pub fn put_f32(buf: &mut impl BufMut, v: f32) {
    buf.put_f32_le(v);
}

pub fn get_f32(buf: &mut impl Buf) -> SyncResult<f32> {
    check_remaining(buf, 4)?;
    Ok(buf.get_f32_le())
}

pub fn put_bool(buf: &mut impl BufMut, v: bool) {
    buf.put_u8(v as u8);
}

pub fn get_bool(buf: &mut impl Buf) -> SyncResult<bool> {
    check_remaining(buf, 1)?;
    Ok(buf.get_u8() != 0)
}

pub fn put_color(buf: &mut impl BufMut, c: Color) {
    buf.put_f32_le(c.r);
    buf.put_f32_le(c.g);
    buf.put_f32_le(c.b);
    buf.put_f32_le(c.a);
}

pub fn get_color(buf: &mut impl Buf) -> SyncResult<Color> {
    check_remaining(buf, 16)?;
    Ok(Color::new(
        buf.get_f32_le(),
        buf.get_f32_le(),
        buf.get_f32_le(),
        buf.get_f32_le(),
    ))
}
