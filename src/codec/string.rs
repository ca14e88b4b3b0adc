//! The string codec family. Short constants piggyback on the common
//! header's `min`/`max` float64 fields, reinterpreting their raw bytes as
//! up to 8 bytes of UTF-8 - the same trick the header uses to avoid
//! a separate on-disk representation for short string constants.

use std::io::{Read, Write};

use crate::column::Value;
use crate::result::{Error, Result};
use crate::stream::{read_string, read_u16, read_u8, write_string, write_u16, write_u8, Endian};

pub(crate) fn string_bytes_to_f64(bytes: &[u8], endian: Endian) -> f64 {
    let mut buf = [0u8; 8];
    let n = bytes.len().min(8);
    buf[..n].copy_from_slice(&bytes[..n]);
    match endian {
        Endian::Little => f64::from_le_bytes(buf),
        Endian::Big => f64::from_be_bytes(buf),
    }
}

pub(crate) fn f64_to_string_value(v: f64, endian: Endian) -> String {
    let buf = match endian {
        Endian::Little => v.to_le_bytes(),
        Endian::Big => v.to_be_bytes(),
    };
    let end = buf.iter().position(|&b| b == 0).unwrap_or(8);
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

#[derive(Debug, Clone)]
pub struct ConstantStringCodec {
    pub(crate) column_name: String,
    pub(crate) value: String,
    pub(crate) num_changes: u64,
}

impl ConstantStringCodec {
    pub(crate) fn new(column_name: String, value: String, num_changes: u64) -> Self {
        Self {
            column_name,
            value,
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
        Value::Str(String::new())
    }

    pub(crate) fn encode_value<W: Write>(&self, _endian: Endian, _w: &mut W, _value: &Value) -> Result<()> {
        Ok(())
    }

    pub(crate) fn decode_value<R: Read>(&self, _endian: Endian, _r: &mut R) -> Result<Value> {
        Ok(Value::Str(self.value.clone()))
    }
}

/// Stores the constant string value directly in the codec-header suffix, for
/// values longer than the 8 bytes `min`/`max` can carry. Gated behind
/// `ODC_ENABLE_WRITING_LONG_STRING_CODEC` on the write path (legacy readers
/// may not know this codec name).
#[derive(Debug, Clone)]
pub struct LongConstantStringCodec {
    pub(crate) column_name: String,
    pub(crate) value: String,
    pub(crate) num_changes: u64,
}

impl LongConstantStringCodec {
    pub(crate) fn new(column_name: String, value: String, num_changes: u64) -> Self {
        Self {
            column_name,
            value,
            num_changes,
        }
    }

    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn num_changes(&self) -> u64 {
        self.num_changes
    }

    pub(crate) fn read_suffix<R: Read>(endian: Endian, r: &mut R) -> Result<String> {
        read_string(endian, r)
    }

    pub(crate) fn write_suffix<W: Write>(&self, endian: Endian, w: &mut W) -> Result<()> {
        write_string(endian, w, &self.value)
    }

    pub(crate) fn encode_value<W: Write>(&self, _endian: Endian, _w: &mut W, _value: &Value) -> Result<()> {
        Ok(())
    }

    pub(crate) fn decode_value<R: Read>(&self, _endian: Endian, _r: &mut R) -> Result<Value> {
        Ok(Value::Str(self.value.clone()))
    }
}

/// Dictionary-coded string columns: a deduplicated table of distinct values
/// carried in the header suffix, indexed by a fixed-width integer per row.
#[derive(Debug, Clone)]
pub struct DictionaryStringCodec {
    pub(crate) column_name: String,
    pub(crate) wide: bool,
    pub(crate) dictionary: Vec<String>,
    pub(crate) num_changes: u64,
}

impl DictionaryStringCodec {
    pub(crate) fn new(column_name: String, wide: bool, dictionary: Vec<String>, num_changes: u64) -> Self {
        Self {
            column_name,
            wide,
            dictionary,
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
        Value::Str(String::new())
    }

    pub(crate) fn read_suffix<R: Read>(endian: Endian, r: &mut R) -> Result<Vec<String>> {
        let count = read_u16(endian, r)?;
        (0..count).map(|_| read_string(endian, r)).collect()
    }

    pub(crate) fn write_suffix<W: Write>(&self, endian: Endian, w: &mut W) -> Result<()> {
        write_u16(endian, w, self.dictionary.len() as u16)?;
        for s in &self.dictionary {
            write_string(endian, w, s)?;
        }
        Ok(())
    }

    fn index_of(&self, s: &str) -> Result<usize> {
        self.dictionary
            .iter()
            .position(|d| d == s)
            .ok_or_else(|| Error::CorruptData(format!("value '{s}' absent from string dictionary")))
    }

    pub(crate) fn encode_value<W: Write>(&self, endian: Endian, w: &mut W, value: &Value) -> Result<()> {
        let s = match value {
            Value::Str(s) => s.as_str(),
            Value::Missing => "",
            _ => return Err(Error::CorruptData("expected string value".into())),
        };
        let idx = self.index_of(s)?;
        if self.wide {
            write_u16(endian, w, idx as u16)
        } else {
            write_u8(w, idx as u8)
        }
    }

    pub(crate) fn decode_value<R: Read>(&self, endian: Endian, r: &mut R) -> Result<Value> {
        let idx = if self.wide { read_u16(endian, r)? as usize } else { read_u8(r)? as usize };
        let s = self
            .dictionary
            .get(idx)
            .ok_or_else(|| Error::CorruptData(format!("string dictionary index {idx} out of range")))?;
        Ok(Value::Str(s.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_string_round_trips_through_float_bits() {
        let bits = string_bytes_to_f64(b"hello\0\0\0", Endian::Little);
        assert_eq!(f64_to_string_value(bits, Endian::Little), "hello");
    }

    #[test]
    fn constant_string_without_nul_padding_keeps_all_eight_bytes() {
        let bits = string_bytes_to_f64(b"helloAAA", Endian::Little);
        assert_eq!(f64_to_string_value(bits, Endian::Little), "helloAAA");
    }

    #[test]
    fn dictionary_codec_round_trips() {
        let codec = DictionaryStringCodec::new("x".into(), false, vec!["a".into(), "bb".into()], 0);
        let mut buf = Vec::new();
        codec.encode_value(Endian::Little, &mut buf, &Value::Str("bb".into())).unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        assert_eq!(codec.decode_value(Endian::Little, &mut cursor).unwrap(), Value::Str("bb".into()));
    }
}
