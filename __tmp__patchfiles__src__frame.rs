//! Frame header I/O and the [`Frame`] type: one self-contained unit of
//! header-part-1 + header-part-2 + data region.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use md5::{Digest, Md5};

use crate::codec::{self, Codec};
use crate::column::{ColumnInfo, DataType, Value};
use crate::constants::{ENDIAN_MARKER, FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR, MAGIC, NEW_HEADER_MARKER};
use crate::result::{Error, Result};
use crate::row;
use crate::stream::{
    read_f64, read_i32, read_i64, read_string, read_u32, write_f64, write_i32, write_i64, write_string, write_u32, Endian,
};
use crate::utils::split_qualified;

/// One parsed frame plus any later frames aggregated onto it.
#[derive(Debug, Clone)]
pub struct Frame {
    endian: Endian,
    row_count: i64,
    flags: Vec<f64>,
    properties: Vec<(String, String)>,
    codecs: Vec<Codec>,
    data: Vec<u8>,
    trailing: Vec<Frame>,
}

enum Resolved {
    Direct(usize),
    Bitfield(usize, usize),
}

impl Frame {
    pub(crate) fn new(
        endian: Endian,
        row_count: i64,
        flags: Vec<f64>,
        properties: Vec<(String, String)>,
        codecs: Vec<Codec>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            endian,
            row_count,
            flags,
            properties,
            codecs,
            data,
            trailing: Vec::new(),
        }
    }

    /// Parses one frame's header-part-1 + header-part-2 and buffers its data
    /// region. Returns `Ok(None)` on a clean end of stream: a short read at
    /// the very start of a candidate frame, before any byte of it has been
    /// consumed, is treated as normal EOF rather than a truncation error.
    pub fn read<R: Read>(r: &mut R) -> Result<Option<Self>> {
        let mut first = [0u8; 1];
        if r.read(&mut first)? == 0 {
            return Ok(None);
        }
        let mut second = [0u8; 1];
        r.read_exact(&mut second)?;
        let marker = u16::from_be_bytes([first[0], second[0]]);
        if marker != NEW_HEADER_MARKER {
            return Err(Error::BadMagic);
        }

        let mut magic = [0u8; 3];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::BadMagic);
        }

        let mut raw = [0u8; 4];
        r.read_exact(&mut raw)?;
        let endian = if u32::from_le_bytes(raw) == ENDIAN_MARKER {
            Endian::Little
        } else if u32::from_be_bytes(raw) == ENDIAN_MARKER {
            Endian::Big
        } else {
            return Err(Error::BadMagic);
        };

        let major = read_u32(endian, r)?;
        let minor = read_u32(endian, r)?;
        if major != FORMAT_VERSION_MAJOR || minor != FORMAT_VERSION_MINOR {
            return Err(Error::UnsupportedVersion(major, minor));
        }

        let md5_hex = read_string(endian, r)?;
        let header_length = read_u32(endian, r)?;

        let mut header2 = vec![0u8; header_length as usize];
        r.read_exact(&mut header2)?;

        let digest = Md5::digest(&header2);
        let computed_hex = hex_encode(&digest);
        if computed_hex != md5_hex.to_lowercase() {
            return Err(Error::ChecksumMismatch);
        }

        let mut cursor = Cursor::new(&header2);
        let data_size = read_i64(endian, &mut cursor)?;
        let _prev_frame_offset = read_i64(endian, &mut cursor)?;
        let row_count = read_i64(endian, &mut cursor)?;

        let flag_count = read_i32(endian, &mut cursor)?;
        let flags = (0..flag_count).map(|_| read_f64(endian, &mut cursor)).collect::<Result<Vec<_>>>()?;

        let property_count = read_i32(endian, &mut cursor)?;
        let properties = (0..property_count)
            .map(|_| -> Result<(String, String)> {
                let key = read_string(endian, &mut cursor)?;
                let value = read_string(endian, &mut cursor)?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>>>()?;

        let column_count = read_i32(endian, &mut cursor)?;
        let codecs = (0..column_count).map(|_| codec::read_header(endian, &mut cursor)).collect::<Result<Vec<_>>>()?;

        let mut data = vec![0u8; data_size as usize];
        r.read_exact(&mut data)?;

        tracing::debug!(rows = row_count, columns = codecs.len(), ?endian, "parsed frame header");
        Ok(Some(Frame::new(endian, row_count, flags, properties, codecs, data)))
    }

    /// Serializes header-part-1, header-part-2 and the data region.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut header2 = Vec::new();
        write_i64(self.endian, &mut header2, self.data.len() as i64)?;
        write_i64(self.endian, &mut header2, 0)?;
        write_i64(self.endian, &mut header2, self.row_count)?;

        write_i32(self.endian, &mut header2, self.flags.len() as i32)?;
        for flag in &self.flags {
            write_f64(self.endian, &mut header2, *flag)?;
        }

        write_i32(self.endian, &mut header2, self.properties.len() as i32)?;
        for (key, value) in &self.properties {
            write_string(self.endian, &mut header2, key)?;
            write_string(self.endian, &mut header2, value)?;
        }

        write_i32(self.endian, &mut header2, self.codecs.len() as i32)?;
        for c in &self.codecs {
            c.encode_header(self.endian, &mut header2)?;
        }

        w.write_all(&NEW_HEADER_MARKER.to_be_bytes())?;
        w.write_all(MAGIC)?;
        match self.endian {
            Endian::Little => w.write_all(&ENDIAN_MARKER.to_le_bytes())?,
            Endian::Big => w.write_all(&ENDIAN_MARKER.to_be_bytes())?,
        }
        write_u32(self.endian, w, FORMAT_VERSION_MAJOR)?;
        write_u32(self.endian, w, FORMAT_VERSION_MINOR)?;

        let digest = Md5::digest(&header2);
        write_string(self.endian, w, &hex_encode(&digest))?;
        write_u32(self.endian, w, header2.len() as u32)?;

        w.write_all(&header2)?;
        w.write_all(&self.data)?;
        tracing::debug!(rows = self.row_count, columns = self.codecs.len(), "wrote frame");
        Ok(())
    }

    pub fn nrows(&self) -> i64 {
        self.row_count + self.trailing.iter().map(Frame::nrows).sum::<i64>()
    }

    pub fn ncolumns(&self) -> usize {
        self.codecs.len()
    }

    pub(crate) fn group_size(&self) -> usize {
        1 + self.trailing.len()
    }

    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    pub fn columns(&self) -> Vec<ColumnInfo> {
        self.codecs
            .iter()
            .enumerate()
            .map(|(index, c)| ColumnInfo {
                name: c.column_name().to_string(),
                index,
                dtype: c.data_type(),
                datasize: c.data_size(),
                bitfields: c.bitfields().to_vec(),
            })
            .collect()
    }

    pub(crate) fn column_dict(&self) -> Vec<(String, DataType)> {
        self.codecs.iter().map(|c| (c.column_name().to_string(), c.data_type())).collect()
    }

    /// Columns keyed by short name (without any `@table` suffix), for
    /// callers that don't need to disambiguate. Collisions keep the last
    /// column seen; use [`Frame::dataframe`] with a qualified name when that
    /// matters.
    pub fn simple_column_dict(&self) -> HashMap<String, DataType> {
        self.codecs.iter().map(|c| (split_qualified(c.column_name()).0.to_string(), c.data_type())).collect()
    }

    /// Aggregates `other` onto this frame if they share a schema.
    pub(crate) fn append(&mut self, other: Frame) -> Result<()> {
        if self.column_dict() != other.column_dict() {
            return Err(Error::MismatchedFrames);
        }
        self.trailing.push(other);
        Ok(())
    }

    /// Decodes `columns` (default: all direct columns) across this frame and
    /// every aggregated trailing frame, returning a name → value-sequence map.
    pub fn dataframe(&self, columns: Option<&[&str]>) -> Result<HashMap<String, Vec<Value>>> {
        let wanted = self.resolve_requests(columns)?;
        let mut out = HashMap::new();
        self.decode_into(&wanted, &mut out)?;
        for frame in &self.trailing {
            frame.decode_into(&wanted, &mut out)?;
        }
        Ok(out)
    }

    fn decode_into(&self, wanted: &[(String, Resolved)], out: &mut HashMap<String, Vec<Value>>) -> Result<()> {
        let mut cursor = Cursor::new(&self.data);
        let decoded = row::decode_rows(self.endian, &mut cursor, &self.codecs, self.row_count as usize)?;
        for (out_name, resolved) in wanted {
            match resolved {
                Resolved::Direct(idx) => out.entry(out_name.clone()).or_default().extend(decoded[*idx].iter().cloned()),
                Resolved::Bitfield(idx, field_idx) => {
                    let Codec::Bitfield(bc) = &self.codecs[*idx] else {
                        return Err(Error::CorruptData(format!("column '{out_name}' is not a bitfield")));
                    };
                    let field = &bc.fields()[*field_idx];
                    let entry = out.entry(out_name.clone()).or_default();
                    for v in &decoded[*idx] {
                        entry.push(match v {
                            Value::Integer(n) => Value::Integer(bc.extract(*n, field) as i64),
                            Value::Missing => Value::Missing,
                            _ => return Err(Error::CorruptData("bitfield storage did not decode to an integer".into())),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_requests(&self, columns: Option<&[&str]>) -> Result<Vec<(String, Resolved)>> {
        match columns {
            None => Ok(self.codecs.iter().enumerate().map(|(i, c)| (c.column_name().to_string(), Resolved::Direct(i))).collect()),
            Some(names) => names.iter().map(|name| self.resolve_one(name)).collect(),
        }
    }

    fn resolve_one(&self, request: &str) -> Result<(String, Resolved)> {
        match request.split_once('.') {
            None => {
                let idx = self.resolve_column(request)?;
                Ok((request.to_string(), Resolved::Direct(idx)))
            }
            Some((col, rest)) => {
                let (field_name, table) = split_qualified(rest);
                let qualified_col = match table {
                    Some(t) => format!("{col}@{t}"),
                    None => col.to_string(),
                };
                let idx = self.resolve_column(&qualified_col)?;
                let Codec::Bitfield(bc) = &self.codecs[idx] else {
                    return Err(Error::CorruptData(format!("column '{col}' is not a bitfield")));
                };
                let field_idx = bc
                    .fields()
                    .iter()
                    .position(|f| f.name == field_name)
                    .ok_or_else(|| Error::UnknownColumn(request.to_string()))?;
                Ok((request.to_string(), Resolved::Bitfield(idx, field_idx)))
            }
        }
    }

    fn resolve_column(&self, name: &str) -> Result<usize> {
        if let Some(idx) = self.codecs.iter().position(|c| c.column_name() == name) {
            return Ok(idx);
        }
        let matches: Vec<usize> = self
            .codecs
            .iter()
            .enumerate()
            .filter(|(_, c)| split_qualified(c.column_name()).0 == name)
            .map(|(i, _)| i)
            .collect();
        match matches.len() {
            0 => Err(Error::UnknownColumn(name.to_string())),
            1 => Ok(matches[0]),
            _ => Err(Error::AmbiguousColumn(name.to_string())),
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::integer::{IntegerCodec, IntegerShape};

    fn sample_frame() -> Frame {
        let codecs = vec![Codec::Integer(IntegerCodec::new("a".into(), IntegerShape::Int8, 0, 10, 0))];
        let mut data = Vec::new();
        crate::row::encode_rows(Endian::Little, &mut data, &codecs, &[vec![Value::Integer(3)], vec![Value::Integer(7)]]).unwrap();
        Frame::new(Endian::Little, 2, vec![], vec![("origin".into(), "test".into())], codecs, data)
    }

    #[test]
    fn header_round_trips_and_validates_checksum() {
        let frame = sample_frame();
        let mut buf = Vec::new();
        frame.write(&mut buf).unwrap();
        let mut cursor = Cursor::new(buf);
        let decoded = Frame::read(&mut cursor).unwrap().unwrap();
        assert_eq!(decoded.nrows(), 2);
        assert_eq!(decoded.properties(), &[("origin".to_string(), "test".to_string())]);
        let rows = decoded.dataframe(None).unwrap();
        assert_eq!(rows["a"], vec![Value::Integer(3), Value::Integer(7)]);
    }

    #[test]
    fn corrupted_header2_byte_trips_checksum_mismatch() {
        let frame = sample_frame();
        let mut buf = Vec::new();
        frame.write(&mut buf).unwrap();
        // prefix = marker(2) + magic(3) + endian(4) + major(4) + minor(4)
        //        + md5 hex string (4-byte length + 32 hex chars) + header_length(4)
        let prefix_len = 2 + 3 + 4 + 4 + 4 + (4 + 32) + 4;
        buf[prefix_len] ^= 0xff;
        let mut cursor = Cursor::new(buf);
        assert_matches::assert_matches!(Frame::read(&mut cursor), Err(Error::ChecksumMismatch));
    }

    #[test]
    fn empty_stream_is_clean_eof() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(Frame::read(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn mismatched_schemas_refuse_to_aggregate() {
        let mut a = sample_frame();
        let b_codecs = vec![Codec::Integer(IntegerCodec::new("b".into(), IntegerShape::Int8, 0, 10, 0))];
        let b = Frame::new(Endian::Little, 0, vec![], vec![], b_codecs, vec![]);
        assert_matches::assert_matches!(a.append(b), Err(Error::MismatchedFrames));
    }
}


