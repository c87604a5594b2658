//! Parameter codec.
//!
//! Servo parameters travel as 1- or 2-byte little-endian fields. Angles are
//! exchanged in device units: positions span 0..=1000 over 0..=240 degrees,
//! angle offsets span -125..=125 over -30..=30 degrees.

use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, RangeError, Result};

/// Full mechanical travel in degrees.
pub const MAX_DEGREE: f64 = 240.0;
/// Position units at full travel.
pub const MAX_POSITION: u16 = 1000;
/// Largest offset correction in degrees (either direction).
pub const MAX_OFFSET_DEGREE: f64 = 30.0;
/// Offset units at the largest correction.
pub const MAX_OFFSET: i8 = 125;

/// Width of a parameter field on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Byte = 1,
    Word = 2,
}

impl Width {
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Inclusive value range representable in this width.
    pub const fn bounds(self, signed: bool) -> (i32, i32) {
        match (self, signed) {
            (Width::Byte, false) => (0, u8::MAX as i32),
            (Width::Byte, true) => (i8::MIN as i32, i8::MAX as i32),
            (Width::Word, false) => (0, u16::MAX as i32),
            (Width::Word, true) => (i16::MIN as i32, i16::MAX as i32),
        }
    }
}

/// Append `value` to `dst` as a little-endian field.
pub fn encode_into(
    value: i32,
    width: Width,
    signed: bool,
    dst: &mut BytesMut,
) -> std::result::Result<(), RangeError> {
    let (min, max) = width.bounds(signed);
    check_range("parameter", value, min, max)?;

    // Range checked above, the narrowing casts are lossless.
    match (width, signed) {
        (Width::Byte, false) => dst.put_u8(value as u8),
        (Width::Byte, true) => dst.put_i8(value as i8),
        (Width::Word, false) => dst.put_u16_le(value as u16),
        (Width::Word, true) => dst.put_i16_le(value as i16),
    }
    Ok(())
}

/// Encode `value` as a little-endian field.
pub fn encode(value: i32, width: Width, signed: bool) -> std::result::Result<Vec<u8>, RangeError> {
    let mut buf = BytesMut::with_capacity(width.bytes());
    encode_into(value, width, signed, &mut buf)?;
    Ok(buf.to_vec())
}

/// Decode a little-endian field; the slice length is the field width.
pub fn decode(src: &[u8], signed: bool) -> Result<i32> {
    match (src, signed) {
        ([b], false) => Ok(i32::from(*b)),
        ([b], true) => Ok(i32::from(*b as i8)),
        ([lo, hi], false) => Ok(i32::from(u16::from_le_bytes([*lo, *hi]))),
        ([lo, hi], true) => Ok(i32::from(i16::from_le_bytes([*lo, *hi]))),
        _ => Err(FrameError::InvalidWidth(src.len())),
    }
}

/// Fail with a [`RangeError`] unless `min <= value <= max`.
pub fn check_range<T>(
    name: &'static str,
    value: T,
    min: T,
    max: T,
) -> std::result::Result<(), RangeError>
where
    T: PartialOrd + Into<f64> + Copy,
{
    if value < min || value > max {
        return Err(RangeError::new(name, value, min, max));
    }
    Ok(())
}

/// Convert an angle in degrees (0..=240) into position units (0..=1000).
pub fn degree_to_command_units(degree: f64) -> std::result::Result<u16, RangeError> {
    if !(0.0..=MAX_DEGREE).contains(&degree) {
        return Err(RangeError::new("degree", degree, 0.0, MAX_DEGREE));
    }
    Ok((degree * f64::from(MAX_POSITION) / MAX_DEGREE).round() as u16)
}

/// Convert an offset in degrees (-30..=30) into offset units (-125..=125).
pub fn degree_to_offset_units(degree: f64) -> std::result::Result<i8, RangeError> {
    if !(-MAX_OFFSET_DEGREE..=MAX_OFFSET_DEGREE).contains(&degree) {
        return Err(RangeError::new(
            "offset degree",
            degree,
            -MAX_OFFSET_DEGREE,
            MAX_OFFSET_DEGREE,
        ));
    }
    Ok((degree * f64::from(MAX_OFFSET) / MAX_OFFSET_DEGREE).round() as i8)
}

/// Convert position units back into degrees.
pub fn command_units_to_degree(units: i32) -> f64 {
    f64::from(units) * MAX_DEGREE / f64::from(MAX_POSITION)
}

/// Convert offset units back into degrees.
pub fn offset_units_to_degree(units: i8) -> f64 {
    f64::from(units) * MAX_OFFSET_DEGREE / f64::from(MAX_OFFSET)
}
