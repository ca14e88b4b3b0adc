//! Fixed-width read/write primitives shared by the frame header and the
//! codec family. Endianness is resolved once, at frame-header parse time,
//! and threaded through explicitly rather than made global.

use std::io::{Read, Write};

pub use declio::ctx::Endian;
use declio::{Decode, Encode};

use crate::result::Result;

pub(crate) fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    Ok(u8::decode((), r)?)
}

pub(crate) fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    Ok(v.encode((), w)?)
}

pub(crate) fn read_u16<R: Read>(endian: Endian, r: &mut R) -> Result<u16> {
    Ok(u16::decode(endian, r)?)
}

pub(crate) fn write_u16<W: Write>(endian: Endian, w: &mut W, v: u16) -> Result<()> {
    Ok(v.encode(endian, w)?)
}

pub(crate) fn read_u32<R: Read>(endian: Endian, r: &mut R) -> Result<u32> {
    Ok(u32::decode(endian, r)?)
}

pub(crate) fn write_u32<W: Write>(endian: Endian, w: &mut W, v: u32) -> Result<()> {
    Ok(v.encode(endian, w)?)
}

pub(crate) fn read_i32<R: Read>(endian: Endian, r: &mut R) -> Result<i32> {
    Ok(i32::decode(endian, r)?)
}

pub(crate) fn write_i32<W: Write>(endian: Endian, w: &mut W, v: i32) -> Result<()> {
    Ok(v.encode(endian, w)?)
}

pub(crate) fn read_i64<R: Read>(endian: Endian, r: &mut R) -> Result<i64> {
    Ok(i64::decode(endian, r)?)
}

pub(crate) fn write_i64<W: Write>(endian: Endian, w: &mut W, v: i64) -> Result<()> {
    Ok(v.encode(endian, w)?)
}

pub(crate) fn read_f32<R: Read>(endian: Endian, r: &mut R) -> Result<f32> {
    Ok(f32::decode(endian, r)?)
}

pub(crate) fn write_f32<W: Write>(endian: Endian, w: &mut W, v: f32) -> Result<()> {
    Ok(v.encode(endian, w)?)
}

pub(crate) fn read_f64<R: Read>(endian: Endian, r: &mut R) -> Result<f64> {
    Ok(f64::decode(endian, r)?)
}

pub(crate) fn write_f64<W: Write>(endian: Endian, w: &mut W, v: f64) -> Result<()> {
    Ok(v.encode(endian, w)?)
}

/// Reads the 16-bit start-column marker. `NEW_HEADER_MARKER` (`65535`) read
/// in big-endian, ahead of a frame's endianness being known, signals a new
/// frame header; within a frame's data region it is read in the frame's
/// resolved endianness.
pub(crate) fn read_marker<R: Read>(endian: Endian, r: &mut R) -> Result<u16> {
    read_u16(endian, r)
}

pub(crate) fn write_marker<W: Write>(endian: Endian, w: &mut W, v: u16) -> Result<()> {
    write_u16(endian, w, v)
}

/// Length-prefixed string: `int32` length (raw byte count, no NUL padding)
/// followed by that many UTF-8 bytes.
pub(crate) fn read_string<R: Read>(endian: Endian, r: &mut R) -> Result<String> {
    let len = read_i32(endian, r)?;
    let mut buf = vec![0u8; len.max(0) as usize];
    r.read_exact(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}

pub(crate) fn write_string<W: Write>(endian: Endian, w: &mut W, s: &str) -> Result<()> {
    write_i32(endian, w, s.len() as i32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn string_round_trips() {
        let mut buf = Vec::new();
        write_string(Endian::Little, &mut buf, "aoeu").unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_string(Endian::Little, &mut cursor).unwrap(), "aoeu");
    }

    #[test]
    fn marker_respects_endianness() {
        let mut buf = Vec::new();
        write_marker(Endian::Big, &mut buf, 65535).unwrap();
        assert_eq!(buf, [0xff, 0xff]);
    }
}
