//! BITFIELD columns: an [`IntegerCodec`] carrying a sub-field schema instead
//! of a single scalar meaning. Storage and row-delta behaviour are identical
//! to the plain integer family; only the header's `column_type` and the
//! trailing sub-field list differ.

use std::io::{Read, Write};

use crate::codec::integer::IntegerCodec;
use crate::column::{bitfield_offsets, Bitfield, Value};
use crate::result::Result;
use crate::stream::{read_string, read_u8, write_string, write_u8, Endian};

#[derive(Debug, Clone)]
pub struct BitfieldCodec {
    pub(crate) storage: IntegerCodec,
    pub(crate) fields: Vec<Bitfield>,
}

impl BitfieldCodec {
    pub(crate) fn new(storage: IntegerCodec, schema: Vec<(String, u8)>) -> Self {
        Self {
            storage,
            fields: bitfield_offsets(&schema),
        }
    }

    pub fn column_name(&self) -> &str {
        self.storage.column_name()
    }

    pub fn num_changes(&self) -> u64 {
        self.storage.num_changes()
    }

    pub fn fields(&self) -> &[Bitfield] {
        &self.fields
    }

    pub fn typed_missing_value(&self) -> Value {
        self.storage.typed_missing_value()
    }

    pub(crate) fn read_suffix<R: Read>(endian: Endian, r: &mut R) -> Result<Vec<(String, u8)>> {
        let count = read_u8(r)?;
        (0..count)
            .map(|_| -> Result<(String, u8)> {
                let name = read_string(endian, r)?;
                let size = read_u8(r)?;
                Ok((name, size))
            })
            .collect()
    }

    pub(crate) fn write_suffix<W: Write>(&self, endian: Endian, w: &mut W) -> Result<()> {
        write_u8(w, self.fields.len() as u8)?;
        for field in &self.fields {
            write_string(endian, w, &field.name)?;
            write_u8(w, field.size)?;
        }
        Ok(())
    }

    pub(crate) fn encode_value<W: Write>(&self, endian: Endian, w: &mut W, value: &Value) -> Result<()> {
        self.storage.encode_value(endian, w, value)
    }

    pub(crate) fn decode_value<R: Read>(&self, endian: Endian, r: &mut R) -> Result<Value> {
        self.storage.decode_value(endian, r)
    }

    /// Extracts one sub-field's unsigned value out of a decoded storage
    /// integer via shift-and-mask; sub-fields are never stored separately.
    pub fn extract(&self, storage_value: i64, field: &Bitfield) -> u64 {
        let mask = if field.size >= 64 { u64::MAX } else { (1u64 << field.size) - 1 };
        ((storage_value as u64) >> field.offset) & mask
    }
}
