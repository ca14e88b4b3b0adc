//! Codec header I/O and the closed [`Codec`] tagged union dispatching to the
//! per-family implementations. A closed enum was chosen over trait objects
//! because `read_header` must construct a concrete variant from a name
//! string before any generic value can flow through it, which an
//! object-safe `dyn Codec` over `Read`/`Write` cannot express cleanly.

pub mod bitfield;
pub mod integer;
pub mod real;
pub mod selector;
pub mod string;

use std::io::{Read, Write};

use crate::column::{Bitfield, DataType, Value};
use crate::constants::MISSING_INTEGER;
use crate::result::{Error, Result};
use crate::stream::{read_f64, read_string, read_u32, read_u8, write_f64, write_string, write_u32, write_u8, Endian};

use bitfield::BitfieldCodec;
use integer::{IntegerCodec, IntegerShape};
use real::{RealCodec, RealShape};
use string::{ConstantStringCodec, DictionaryStringCodec, LongConstantStringCodec};

/// The common prefix shared by every codec header: `name`/`has_missing`/
/// `min`/`max`/missing-value overrides, plus `column_type`, carried here too
/// so that a name shared across families (`"constant"` means different
/// things for INTEGER, REAL and BITFIELD columns) can be resolved without
/// guessing from context.
struct CodecHeaderCommon {
    name: String,
    has_missing: bool,
    min: f64,
    max: f64,
    column_type: DataType,
    missing_value_int: u32,
    missing_value_real: f64,
}

impl CodecHeaderCommon {
    fn read<R: Read>(endian: Endian, r: &mut R) -> Result<Self> {
        let name = read_string(endian, r)?;
        let has_missing = read_u8(r)? != 0;
        let min = read_f64(endian, r)?;
        let max = read_f64(endian, r)?;
        let column_type = DataType::try_from(read_u8(r)?)?;
        let missing_value_int = read_u32(endian, r)?;
        let missing_value_real = read_f64(endian, r)?;
        Ok(Self {
            name,
            has_missing,
            min,
            max,
            column_type,
            missing_value_int,
            missing_value_real,
        })
    }

    fn write<W: Write>(&self, endian: Endian, w: &mut W) -> Result<()> {
        write_string(endian, w, &self.name)?;
        write_u8(w, self.has_missing as u8)?;
        write_f64(endian, w, self.min)?;
        write_f64(endian, w, self.max)?;
        write_u8(w, self.column_type.code())?;
        write_u32(endian, w, self.missing_value_int)?;
        write_f64(endian, w, self.missing_value_real)?;
        Ok(())
    }
}

/// One column's encode/decode strategy, bound 1:1 to a [`crate::column::ColumnInfo`].
#[derive(Debug, Clone)]
pub enum Codec {
    Integer(IntegerCodec),
    Real(RealCodec),
    ConstantString(ConstantStringCodec),
    LongConstantString(LongConstantStringCodec),
    DictionaryString(DictionaryStringCodec),
    Bitfield(BitfieldCodec),
}

impl Codec {
    pub fn column_name(&self) -> &str {
        match self {
            Codec::Integer(c) => c.column_name(),
            Codec::Real(c) => c.column_name(),
            Codec::ConstantString(c) => c.column_name(),
            Codec::LongConstantString(c) => c.column_name(),
            Codec::DictionaryString(c) => c.column_name(),
            Codec::Bitfield(c) => c.column_name(),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Codec::Integer(_) => DataType::Integer,
            Codec::Real(_) => DataType::Real,
            Codec::ConstantString(_) | Codec::LongConstantString(_) | Codec::DictionaryString(_) => DataType::String,
            Codec::Bitfield(_) => DataType::Bitfield,
        }
    }

    pub fn data_size(&self) -> u32 {
        match self {
            Codec::Integer(c) => c.shape.data_size(),
            Codec::Real(c) => c.shape.data_size(),
            Codec::ConstantString(_) | Codec::LongConstantString(_) => 0,
            Codec::DictionaryString(c) => {
                if c.wide {
                    2
                } else {
                    1
                }
            }
            Codec::Bitfield(c) => c.storage.shape.data_size(),
        }
    }

    pub fn num_changes(&self) -> u64 {
        match self {
            Codec::Integer(c) => c.num_changes(),
            Codec::Real(c) => c.num_changes(),
            Codec::ConstantString(c) => c.num_changes(),
            Codec::LongConstantString(c) => c.num_changes(),
            Codec::DictionaryString(c) => c.num_changes(),
            Codec::Bitfield(c) => c.num_changes(),
        }
    }

    pub fn typed_missing_value(&self) -> Value {
        match self {
            Codec::Integer(c) => c.typed_missing_value(),
            Codec::Real(c) => c.typed_missing_value(),
            Codec::ConstantString(c) => c.typed_missing_value(),
            Codec::LongConstantString(_) => Value::Str(String::new()),
            Codec::DictionaryString(c) => c.typed_missing_value(),
            Codec::Bitfield(c) => c.typed_missing_value(),
        }
    }

    pub fn bitfields(&self) -> &[Bitfield] {
        match self {
            Codec::Bitfield(c) => c.fields(),
            _ => &[],
        }
    }

    pub(crate) fn encode_value<W: Write>(&self, endian: Endian, w: &mut W, value: &Value) -> Result<()> {
        match self {
            Codec::Integer(c) => c.encode_value(endian, w, value),
            Codec::Real(c) => c.encode_value(endian, w, value),
            Codec::ConstantString(c) => c.encode_value(endian, w, value),
            Codec::LongConstantString(c) => c.encode_value(endian, w, value),
            Codec::DictionaryString(c) => c.encode_value(endian, w, value),
            Codec::Bitfield(c) => c.encode_value(endian, w, value),
        }
    }

    pub(crate) fn decode_value<R: Read>(&self, endian: Endian, r: &mut R) -> Result<Value> {
        match self {
            Codec::Integer(c) => c.decode_value(endian, r),
            Codec::Real(c) => c.decode_value(endian, r),
            Codec::ConstantString(c) => c.decode_value(endian, r),
            Codec::LongConstantString(c) => c.decode_value(endian, r),
            Codec::DictionaryString(c) => c.decode_value(endian, r),
            Codec::Bitfield(c) => c.decode_value(endian, r),
        }
    }

    pub(crate) fn encode_header<W: Write>(&self, endian: Endian, w: &mut W) -> Result<()> {
        let common = self.header_common();
        common.write(endian, w)?;
        match self {
            Codec::Bitfield(c) => c.write_suffix(endian, w),
            Codec::LongConstantString(c) => c.write_suffix(endian, w),
            Codec::DictionaryString(c) => c.write_suffix(endian, w),
            _ => Ok(()),
        }
    }

    fn header_common(&self) -> CodecHeaderCommon {
        match self {
            Codec::Integer(c) => CodecHeaderCommon {
                name: c.shape.name().to_string(),
                has_missing: c.shape.has_missing(),
                min: c.min as f64,
                max: c.max as f64,
                column_type: DataType::Integer,
                missing_value_int: MISSING_INTEGER as u32,
                missing_value_real: 0.0,
            },
            Codec::Real(c) => CodecHeaderCommon {
                name: c.shape.name().to_string(),
                has_missing: !matches!(c.shape, RealShape::Constant),
                min: c.min(),
                max: c.max(),
                column_type: DataType::Real,
                missing_value_int: 0,
                missing_value_real: crate::constants::MISSING_REAL,
            },
            Codec::ConstantString(c) => CodecHeaderCommon {
                name: "constant_string".to_string(),
                has_missing: false,
                min: string::string_bytes_to_f64(c.value.as_bytes(), Endian::Little),
                max: string::string_bytes_to_f64(c.value.as_bytes(), Endian::Little),
                column_type: DataType::String,
                missing_value_int: 0,
                missing_value_real: 0.0,
            },
            Codec::LongConstantString(_) => CodecHeaderCommon {
                name: "long_constant_string".to_string(),
                has_missing: false,
                min: 0.0,
                max: 0.0,
                column_type: DataType::String,
                missing_value_int: 0,
                missing_value_real: 0.0,
            },
            Codec::DictionaryString(c) => CodecHeaderCommon {
                name: if c.wide { "int16_string" } else { "int8_string" }.to_string(),
                has_missing: false,
                min: 0.0,
                max: 0.0,
                column_type: DataType::String,
                missing_value_int: 0,
                missing_value_real: 0.0,
            },
            Codec::Bitfield(c) => CodecHeaderCommon {
                name: c.storage.shape.name().to_string(),
                has_missing: c.storage.shape.has_missing(),
                min: c.storage.min as f64,
                max: c.storage.max as f64,
                column_type: DataType::Bitfield,
                missing_value_int: MISSING_INTEGER as u32,
                missing_value_real: 0.0,
            },
        }
    }
}

pub(crate) fn read_header<R: Read>(endian: Endian, r: &mut R) -> Result<Codec> {
    let common = CodecHeaderCommon::read(endian, r)?;

    // `column_type` picks which family's name table applies before the name
    // is even looked up: "constant" is a valid codec name in both the
    // integer and real families, and guessing the family from the name
    // alone would always resolve it to whichever family is tried first.
    match common.column_type {
        DataType::Real | DataType::Double => {
            if let Some(shape) = RealShape::from_name(&common.name) {
                return Ok(Codec::Real(RealCodec::new(common.name.clone(), shape, common.min, common.max, 0)));
            }
            return Err(Error::UnknownCodec(common.name.clone()));
        }
        DataType::Integer | DataType::Bitfield => {
            let shape = IntegerShape::from_name(&common.name).ok_or_else(|| Error::UnknownCodec(common.name.clone()))?;
            let storage = IntegerCodec::new(common.name.clone(), shape, common.min as i64, common.max as i64, 0);
            return match common.column_type {
                DataType::Bitfield => {
                    let schema = BitfieldCodec::read_suffix(endian, r)?;
                    Ok(Codec::Bitfield(BitfieldCodec::new(storage, schema)?))
                }
                DataType::Integer => Ok(Codec::Integer(storage)),
                _ => unreachable!(),
            };
        }
        _ => {}
    }

    match common.name.as_str() {
        "constant_string" => {
            let value = string::f64_to_string_value(common.min, endian);
            Ok(Codec::ConstantString(ConstantStringCodec::new(common.name.clone(), value, 0)))
        }
        "long_constant_string" => {
            let value = LongConstantStringCodec::read_suffix(endian, r)?;
            Ok(Codec::LongConstantString(LongConstantStringCodec::new(common.name.clone(), value, 0)))
        }
        "int8_string" => {
            let dict = DictionaryStringCodec::read_suffix(endian, r)?;
            Ok(Codec::DictionaryString(DictionaryStringCodec::new(common.name.clone(), false, dict, 0)))
        }
        "int16_string" => {
            let dict = DictionaryStringCodec::read_suffix(endian, r)?;
            Ok(Codec::DictionaryString(DictionaryStringCodec::new(common.name.clone(), true, dict, 0)))
        }
        other => Err(Error::UnknownCodec(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn int8_header_round_trips() {
        let codec = Codec::Integer(IntegerCodec::new("x".into(), IntegerShape::Int8, 3, 9, 2));
        let mut buf = Vec::new();
        codec.encode_header(Endian::Little, &mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        let decoded = read_header(Endian::Little, &mut cursor).unwrap();
        assert_eq!(decoded.column_name(), "x");
        assert_eq!(decoded.data_type(), DataType::Integer);
        assert_eq!(decoded.data_size(), 1);
    }

    #[test]
    fn bitfield_header_round_trips_with_schema() {
        let storage = IntegerCodec::new("flags".into(), IntegerShape::Int8, 0, 255, 0);
        let codec = Codec::Bitfield(BitfieldCodec::new(storage, vec![("a".into(), 3), ("b".into(), 5)]).unwrap());
        let mut buf = Vec::new();
        codec.encode_header(Endian::Little, &mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        let decoded = read_header(Endian::Little, &mut cursor).unwrap();
        assert_eq!(decoded.data_type(), DataType::Bitfield);
        assert_eq!(decoded.bitfields().len(), 2);
        assert_eq!(decoded.bitfields()[1].offset, 3);
    }

    #[test]
    fn constant_real_header_round_trips_despite_sharing_a_name_with_constant_integer() {
        let codec = Codec::Real(RealCodec::new("x".into(), RealShape::Constant, 4.5, 4.5, 0));
        let mut buf = Vec::new();
        codec.encode_header(Endian::Little, &mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        let decoded = read_header(Endian::Little, &mut cursor).unwrap();
        assert_eq!(decoded.data_type(), DataType::Real);
        match decoded {
            Codec::Real(c) => assert_eq!(c.min, 4.5),
            _ => panic!("expected real codec"),
        }
    }

    #[test]
    fn unknown_codec_name_errors() {
        let mut buf = Vec::new();
        let common = CodecHeaderCommon {
            name: "bogus".into(),
            has_missing: false,
            min: 0.0,
            max: 0.0,
            column_type: DataType::Integer,
            missing_value_int: 0,
            missing_value_real: 0.0,
        };
        common.write(Endian::Little, &mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        assert!(read_header(Endian::Little, &mut cursor).is_err());
    }
}
