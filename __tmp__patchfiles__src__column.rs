//! The in-memory column model: [`DataType`], [`Bitfield`], [`ColumnInfo`]
//! and the decoded/source [`Value`] cell type.

use std::fmt;

use crate::result::{Error, Result};

/// Tagged enumeration of on-disk column types, fixed numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    Ignore = 0,
    Integer = 1,
    Real = 2,
    String = 3,
    Bitfield = 4,
    Double = 5,
}

impl DataType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Ignore => "ignore",
            DataType::Integer => "integer",
            DataType::Real => "real",
            DataType::String => "string",
            DataType::Bitfield => "bitfield",
            DataType::Double => "double",
        }
    }
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(DataType::Ignore),
            1 => Ok(DataType::Integer),
            2 => Ok(DataType::Real),
            3 => Ok(DataType::String),
            4 => Ok(DataType::Bitfield),
            5 => Ok(DataType::Double),
            other => Err(Error::CorruptData(format!("unknown data type code {other}"))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One named, sized sub-field of a BITFIELD column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitfield {
    pub name: String,
    pub size: u8,
    pub offset: u8,
}

/// Derives exclusive-prefix-sum offsets for a bitfield sub-schema.
pub(crate) fn bitfield_offsets(fields: &[(String, u8)]) -> Vec<Bitfield> {
    let mut offset = 0u8;
    let mut out = Vec::with_capacity(fields.len());
    for (name, size) in fields {
        out.push(Bitfield {
            name: name.clone(),
            size: *size,
            offset,
        });
        offset += *size;
    }
    out
}

/// Static description of a column: name, position, type, on-disk width and
/// (for BITFIELD columns) sub-field schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub index: usize,
    pub dtype: DataType,
    pub datasize: u32,
    pub bitfields: Vec<Bitfield>,
}

impl ColumnInfo {
    /// The short name, stripped of any `@table` qualifier.
    pub fn short_name(&self) -> &str {
        crate::utils::split_qualified(&self.name).0
    }
}

impl fmt::Display for ColumnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dtype == DataType::Bitfield {
            write!(f, "{}:{}(", self.name, self.dtype)?;
            for (i, b) in self.bitfields.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}:{}", b.name, b.size)?;
            }
            write!(f, ")")
        } else {
            write!(f, "{}:{}", self.name, self.dtype)
        }
    }
}

/// One decoded or to-be-encoded cell. `Missing` is a single logical value
/// regardless of which on-disk sentinel produced it.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Str(String),
    Missing,
}

/// Real values compare via [`OrderedFloat`](ordered_float::OrderedFloat) so
/// that two missing values (and, incidentally, two NaNs) compare equal -
/// the total equality the row-delta protocol relies on to detect when a
/// row repeats the previous one.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use ordered_float::OrderedFloat as OF;
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => OF(*a) == OF(*b),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Missing, Value::Missing) => true,
            _ => false,
        }
    }
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl Eq for Value {}
