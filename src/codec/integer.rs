//! The integer codec family. `IntegerShape` also backs BITFIELD columns,
//! which pack one of these shapes and read/write identically - only the
//! header's `column_type` differs.

use std::io::{Read, Write};

use crate::column::Value;
use crate::constants::MISSING_INTEGER;
use crate::result::{Error, Result};
use crate::stream::{read_i32, read_u16, read_u8, write_i32, write_u16, write_u8, Endian};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntegerShape {
    Constant,
    ConstantOrMissing,
    Int8,
    Int8Missing,
    Int16,
    Int16Missing,
    Int32,
}

impl IntegerShape {
    pub(crate) fn name(self) -> &'static str {
        match self {
            IntegerShape::Constant => "constant",
            IntegerShape::ConstantOrMissing => "constant_or_missing",
            IntegerShape::Int8 => "int8",
            IntegerShape::Int8Missing => "int8_missing",
            IntegerShape::Int16 => "int16",
            IntegerShape::Int16Missing => "int16_missing",
            IntegerShape::Int32 => "int32",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "constant" => IntegerShape::Constant,
            "constant_or_missing" => IntegerShape::ConstantOrMissing,
            "int8" => IntegerShape::Int8,
            "int8_missing" => IntegerShape::Int8Missing,
            "int16" => IntegerShape::Int16,
            "int16_missing" => IntegerShape::Int16Missing,
            "int32" => IntegerShape::Int32,
            _ => return None,
        })
    }

    pub(crate) fn data_size(self) -> u32 {
        match self {
            IntegerShape::Constant => 0,
            IntegerShape::ConstantOrMissing | IntegerShape::Int8 | IntegerShape::Int8Missing => 1,
            IntegerShape::Int16 | IntegerShape::Int16Missing => 2,
            IntegerShape::Int32 => 4,
        }
    }

    pub(crate) fn has_missing(self) -> bool {
        matches!(
            self,
            IntegerShape::ConstantOrMissing | IntegerShape::Int8Missing | IntegerShape::Int16Missing
        )
    }

    /// Bit width of the value a BITFIELD sub-schema can actually address.
    /// Constant shapes decode to an arbitrary stored `i64`, so they impose no
    /// narrower ceiling than the storage integer itself.
    pub(crate) fn storage_bits(self) -> u32 {
        match self {
            IntegerShape::Constant | IntegerShape::ConstantOrMissing => 64,
            IntegerShape::Int8 | IntegerShape::Int8Missing => 8,
            IntegerShape::Int16 | IntegerShape::Int16Missing => 16,
            IntegerShape::Int32 => 32,
        }
    }
}

/// A column stored via one of the [`IntegerShape`] encodings.
#[derive(Debug, Clone)]
pub struct IntegerCodec {
    pub(crate) column_name: String,
    pub(crate) shape: IntegerShape,
    pub(crate) min: i64,
    pub(crate) max: i64,
    pub(crate) num_changes: u64,
}

impl IntegerCodec {
    pub(crate) fn new(column_name: String, shape: IntegerShape, min: i64, max: i64, num_changes: u64) -> Self {
        Self {
            column_name,
            shape,
            min,
            max,
            num_changes,
        }
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn num_changes(&self) -> u64 {
        self.num_changes
    }

    pub fn typed_missing_value(&self) -> Value {
        Value::Integer(MISSING_INTEGER)
    }

    pub(crate) fn encode_value<W: Write>(&self, endian: Endian, w: &mut W, value: &Value) -> Result<()> {
        let missing = value.is_missing();
        match self.shape {
            IntegerShape::Constant => Ok(()),
            IntegerShape::ConstantOrMissing => write_u8(w, if missing { 0xff } else { 0 }),
            IntegerShape::Int8 => {
                let v = value.as_integer().ok_or_else(|| Error::CorruptData("expected integer value".into()))?;
                write_u8(w, (v - self.min) as u8)
            }
            IntegerShape::Int8Missing => {
                if missing {
                    write_u8(w, 0xff)
                } else {
                    let v = value.as_integer().ok_or_else(|| Error::CorruptData("expected integer value".into()))?;
                    write_u8(w, (v - self.min) as u8)
                }
            }
            IntegerShape::Int16 => {
                let v = value.as_integer().ok_or_else(|| Error::CorruptData("expected integer value".into()))?;
                write_u16(endian, w, (v - self.min) as u16)
            }
            IntegerShape::Int16Missing => {
                if missing {
                    write_u16(endian, w, 0xffff)
                } else {
                    let v = value.as_integer().ok_or_else(|| Error::CorruptData("expected integer value".into()))?;
                    write_u16(endian, w, (v - self.min) as u16)
                }
            }
            IntegerShape::Int32 => {
                let v = if missing {
                    MISSING_INTEGER as i32
                } else {
                    value.as_integer().ok_or_else(|| Error::CorruptData("expected integer value".into()))? as i32
                };
                write_i32(endian, w, v)
            }
        }
    }

    pub(crate) fn decode_value<R: Read>(&self, endian: Endian, r: &mut R) -> Result<Value> {
        Ok(match self.shape {
            IntegerShape::Constant => Value::Integer(self.min),
            IntegerShape::ConstantOrMissing => {
                if read_u8(r)? == 0xff {
                    Value::Missing
                } else {
                    Value::Integer(self.min)
                }
            }
            IntegerShape::Int8 => Value::Integer(self.min + read_u8(r)? as i64),
            IntegerShape::Int8Missing => {
                let b = read_u8(r)?;
                if b == 0xff {
                    Value::Missing
                } else {
                    Value::Integer(self.min + b as i64)
                }
            }
            IntegerShape::Int16 => Value::Integer(self.min + read_u16(endian, r)? as i64),
            IntegerShape::Int16Missing => {
                let b = read_u16(endian, r)?;
                if b == 0xffff {
                    Value::Missing
                } else {
                    Value::Integer(self.min + b as i64)
                }
            }
            IntegerShape::Int32 => {
                let v = read_i32(endian, r)?;
                if v as i64 == MISSING_INTEGER {
                    Value::Missing
                } else {
                    Value::Integer(v as i64)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn int8_missing_round_trips_sentinel_and_offsets() {
        let codec = IntegerCodec::new("x".into(), IntegerShape::Int8Missing, 10, 20, 0);
        let mut buf = Vec::new();
        codec.encode_value(Endian::Little, &mut buf, &Value::Integer(15)).unwrap();
        codec.encode_value(Endian::Little, &mut buf, &Value::Missing).unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(codec.decode_value(Endian::Little, &mut cursor).unwrap(), Value::Integer(15));
        assert_eq!(codec.decode_value(Endian::Little, &mut cursor).unwrap(), Value::Missing);
    }

    #[test]
    fn int32_uses_raw_signed_sentinel() {
        let codec = IntegerCodec::new("x".into(), IntegerShape::Int32, 0, 0, 0);
        let mut buf = Vec::new();
        codec.encode_value(Endian::Little, &mut buf, &Value::Missing).unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(codec.decode_value(Endian::Little, &mut cursor).unwrap(), Value::Missing);
    }
}
