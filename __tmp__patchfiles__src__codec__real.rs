//! The floating-point codec family.

use std::io::{Read, Write};

use crate::column::Value;
use crate::constants::{sr_missing_a, sr_missing_b, LEGACY_DOUBLE_MISSING_BITS, MISSING_REAL};
use crate::result::{Error, Result};
use crate::stream::{read_f32, read_f64, write_f32, write_f64, Endian};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RealShape {
    Constant,
    ConstantOrMissing,
    LongReal,
    ShortReal,
    ShortReal2,
}

impl RealShape {
    pub(crate) fn name(self) -> &'static str {
        match self {
            RealShape::Constant => "constant",
            RealShape::ConstantOrMissing => "real_constant_or_missing",
            RealShape::LongReal => "long_real",
            RealShape::ShortReal => "short_real",
            RealShape::ShortReal2 => "short_real2",
        }
    }

    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "constant" => RealShape::Constant,
            "real_constant_or_missing" => RealShape::ConstantOrMissing,
            "long_real" => RealShape::LongReal,
            "short_real" => RealShape::ShortReal,
            "short_real2" => RealShape::ShortReal2,
            _ => return None,
        })
    }

    pub(crate) fn data_size(self) -> u32 {
        match self {
            RealShape::Constant => 0,
            RealShape::ConstantOrMissing => 1,
            RealShape::LongReal => 8,
            RealShape::ShortReal | RealShape::ShortReal2 => 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RealCodec {
    pub(crate) column_name: String,
    pub(crate) shape: RealShape,
    /// For `Constant`/`ConstantOrMissing`, `min == max` is the stored value.
    /// For the other shapes this is just the header's bounds (invariant 4).
    pub(crate) min: f64,
    pub(crate) max: f64,
    pub(crate) num_changes: u64,
}

impl RealCodec {
    pub(crate) fn new(column_name: String, shape: RealShape, min: f64, max: f64, num_changes: u64) -> Self {
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
        Value::Real(MISSING_REAL)
    }

    pub(crate) fn min(&self) -> f64 {
        self.min
    }

    pub(crate) fn max(&self) -> f64 {
        self.max
    }

    pub(crate) fn encode_value<W: Write>(&self, endian: Endian, w: &mut W, value: &Value) -> Result<()> {
        let missing = value.is_missing();
        match self.shape {
            RealShape::Constant => Ok(()),
            RealShape::ConstantOrMissing => write_real_byte(w, missing),
            RealShape::LongReal => {
                let v = if missing { MISSING_REAL } else { real_operand(value)? };
                write_f64(endian, w, v)
            }
            RealShape::ShortReal => {
                let v = if missing { sr_missing_b() } else { real_operand(value)? as f32 };
                write_f32(endian, w, v)
            }
            RealShape::ShortReal2 => {
                let v = if missing { sr_missing_a() } else { real_operand(value)? as f32 };
                write_f32(endian, w, v)
            }
        }
    }

    pub(crate) fn decode_value<R: Read>(&self, endian: Endian, r: &mut R) -> Result<Value> {
        Ok(match self.shape {
            RealShape::Constant => Value::Real(self.min),
            RealShape::ConstantOrMissing => {
                if read_real_byte(r)? {
                    Value::Missing
                } else {
                    Value::Real(self.min)
                }
            }
            RealShape::LongReal => {
                let v = read_f64(endian, r)?;
                if v == MISSING_REAL || v.to_bits() == LEGACY_DOUBLE_MISSING_BITS {
                    Value::Missing
                } else {
                    Value::Real(v)
                }
            }
            RealShape::ShortReal => {
                let v = read_f32(endian, r)?;
                if v.to_bits() == sr_missing_b().to_bits() {
                    Value::Missing
                } else {
                    Value::Real(v as f64)
                }
            }
            RealShape::ShortReal2 => {
                let v = read_f32(endian, r)?;
                if v.to_bits() == sr_missing_a().to_bits() {
                    Value::Missing
                } else {
                    Value::Real(v as f64)
                }
            }
        })
    }
}

fn real_operand(value: &Value) -> Result<f64> {
    value.as_real().ok_or_else(|| Error::CorruptData("expected real value".into()))
}

fn write_real_byte<W: Write>(w: &mut W, missing: bool) -> Result<()> {
    crate::stream::write_u8(w, if missing { 0xff } else { 0 })
}

fn read_real_byte<R: Read>(r: &mut R) -> Result<bool> {
    Ok(crate::stream::read_u8(r)? == 0xff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn long_real_recognizes_legacy_zero_bits_as_missing() {
        let codec = RealCodec::new("x".into(), RealShape::LongReal, 0.0, 0.0, 0);
        let mut cursor = Cursor::new(vec![0u8; 8]);
        assert_eq!(codec.decode_value(Endian::Little, &mut cursor).unwrap(), Value::Missing);
    }

    #[test]
    fn short_real_and_short_real2_use_distinct_sentinels() {
        let a = RealCodec::new("x".into(), RealShape::ShortReal2, 0.0, 0.0, 0);
        let b = RealCodec::new("x".into(), RealShape::ShortReal, 0.0, 0.0, 0);
        let mut buf_a = Vec::new();
        a.encode_value(Endian::Little, &mut buf_a, &Value::Missing).unwrap();
        let mut buf_b = Vec::new();
        b.encode_value(Endian::Little, &mut buf_b, &Value::Missing).unwrap();
        assert_ne!(buf_a, buf_b);
    }
}


