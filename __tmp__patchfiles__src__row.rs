//! The row-delta protocol: each row is prefixed by a 16-bit start-column
//! marker naming the first column that differs from the previous row: only
//! columns from that point on are actually written.

use std::io::{Read, Write};

use crate::codec::Codec;
use crate::column::Value;
use crate::result::Result;
use crate::stream::{read_marker, write_marker, Endian};

/// Encodes `rows` (row-major, one `Vec<Value>` per row, one entry per
/// column) against the already-selected `codecs`, in column order.
pub(crate) fn encode_rows<W: Write>(endian: Endian, w: &mut W, codecs: &[Codec], rows: &[Vec<Value>]) -> Result<()> {
    let mut last_row: Option<&Vec<Value>> = None;
    for row in rows {
        let start = match last_row {
            None => 0,
            Some(prev) => first_difference(prev, row),
        };
        write_marker(endian, w, start as u16)?;
        for (codec, value) in codecs.iter().zip(row.iter()).skip(start) {
            codec.encode_value(endian, w, value)?;
        }
        last_row = Some(row);
    }
    Ok(())
}

fn first_difference(prev: &[Value], row: &[Value]) -> usize {
    prev.iter().zip(row.iter()).position(|(a, b)| a != b).unwrap_or(row.len())
}

/// Decodes `nrows` rows out of `r`, returning one `Vec<Value>` per column
/// (column-major), each of length exactly `nrows`.
pub(crate) fn decode_rows<R: Read>(endian: Endian, r: &mut R, codecs: &[Codec], nrows: usize) -> Result<Vec<Vec<Value>>> {
    let ncols = codecs.len();
    // Pre-sized rather than appended: a column can go several rows without
    // appearing in the suffix, then have that whole gap duplicated in one
    // shot once the marker regresses past it or the frame ends.
    let mut columns: Vec<Vec<Value>> = vec![vec![Value::Missing; nrows]; ncols];
    let mut last_decoded: Vec<Option<usize>> = vec![None; ncols];
    let mut last_start_col: Option<usize> = None;

    for row_idx in 0..nrows {
        let start_col = read_marker(endian, r)? as usize;

        match last_start_col {
            None if start_col > 0 => {
                // Legacy initial-missing path: a non-zero marker on row 0
                // means the skipped columns carry the typed missing value
                // rather than "no previous row to copy".
                for col in 0..start_col {
                    columns[col][row_idx] = codecs[col].typed_missing_value();
                    last_decoded[col] = Some(row_idx);
                }
            }
            Some(prev_start) if prev_start > start_col => {
                for col in start_col..prev_start {
                    let last = last_decoded[col].expect("carried column must have a prior value");
                    let repeat_value = columns[col][last].clone();
                    for rr in (last + 1)..=row_idx {
                        columns[col][rr] = repeat_value.clone();
                    }
                    last_decoded[col] = Some(row_idx);
                }
            }
            _ => {}
        }

        for col in start_col..ncols {
            columns[col][row_idx] = codecs[col].decode_value(endian, r)?;
            last_decoded[col] = Some(row_idx);
        }
        last_start_col = Some(start_col);
    }

    if let Some(start) = last_start_col {
        for col in 0..start {
            let Some(last) = last_decoded[col] else { continue };
            if last < nrows.saturating_sub(1) {
                let repeat_value = columns[col][last].clone();
                for rr in (last + 1)..nrows {
                    columns[col][rr] = repeat_value.clone();
                }
            }
        }
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::integer::{IntegerCodec, IntegerShape};
    use std::io::Cursor;

    fn int16_codec(name: &str) -> Codec {
        Codec::Integer(IntegerCodec::new(name.into(), IntegerShape::Int16, -1000, 1000, 0))
    }

    #[test]
    fn two_column_delta_round_trips() {
        let codecs = vec![int16_codec("a"), int16_codec("b")];
        let rows = vec![
            vec![Value::Integer(1), Value::Integer(2)],
            vec![Value::Integer(1), Value::Integer(5)],
            vec![Value::Integer(9), Value::Integer(5)],
        ];
        let mut buf = Vec::new();
        encode_rows(Endian::Little, &mut buf, &codecs, &rows).unwrap();
        let mut cursor = Cursor::new(buf);
        let decoded = decode_rows(Endian::Little, &mut cursor, &codecs, rows.len()).unwrap();
        assert_eq!(decoded[0], vec![Value::Integer(1), Value::Integer(1), Value::Integer(9)]);
        assert_eq!(decoded[1], vec![Value::Integer(2), Value::Integer(5), Value::Integer(5)]);
    }

    #[test]
    fn legacy_nonzero_initial_marker_fills_typed_missing() {
        let codecs = vec![int16_codec("a"), int16_codec("b")];
        let mut buf = Vec::new();
        write_marker(Endian::Little, &mut buf, 1).unwrap();
        codecs[1].encode_value(Endian::Little, &mut buf, &Value::Integer(7)).unwrap();
        let mut cursor = Cursor::new(buf);
        let decoded = decode_rows(Endian::Little, &mut cursor, &codecs, 1).unwrap();
        assert_eq!(decoded[0][0], codecs[0].typed_missing_value());
        assert_eq!(decoded[1][0], Value::Integer(7));
    }
}


