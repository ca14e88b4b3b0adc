//! Splits column batches into row-limited frames and encodes each
//! independently.

use std::io::Write;

use crate::codec::selector::select_codec;
use crate::codec::Codec;
use crate::column::Value;
use crate::config::EncoderConfig;
use crate::frame::Frame;
use crate::result::Result;
use crate::row;
use crate::stream::Endian;

pub struct Writer<W: Write> {
    sink: W,
    config: EncoderConfig,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W, config: EncoderConfig) -> Self {
        Self { sink, config }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Writes `columns` (name, full value sequence) as one or more frames of
    /// at most `rows_per_frame` rows each. The column order chosen for this
    /// call's first sub-frame is reused by its later sub-frames (unless
    /// `config.column_order` pins an explicit order); a later, independent
    /// call starts over and may pick a different order for its own frame 0.
    pub fn write_columns(&mut self, columns: &[(String, Vec<Value>)]) -> Result<()> {
        let nrows = columns.first().map_or(0, |(_, v)| v.len());
        for (name, values) in columns {
            if values.len() != nrows {
                return Err(crate::result::Error::CorruptData(format!(
                    "column '{name}' has {} rows but column '{}' has {nrows}",
                    values.len(),
                    columns[0].0
                )));
            }
        }
        let endian = if self.config.bigendian { Endian::Big } else { Endian::Little };
        let rows_per_frame = self.config.rows_per_frame.max(1);
        let mut reused_order: Option<Vec<usize>> = None;

        if nrows == 0 {
            self.write_frame(columns, 0, 0, endian, &mut reused_order)?;
            return Ok(());
        }

        let mut start = 0;
        while start < nrows {
            let end = (start + rows_per_frame).min(nrows);
            self.write_frame(columns, start, end, endian, &mut reused_order)?;
            start = end;
        }
        Ok(())
    }

    fn write_frame(
        &mut self,
        columns: &[(String, Vec<Value>)],
        start: usize,
        end: usize,
        endian: Endian,
        reused_order: &mut Option<Vec<usize>>,
    ) -> Result<()> {
        let slices: Vec<&[Value]> = columns.iter().map(|(_, v)| &v[start..end]).collect();

        let codecs: Vec<Codec> = columns
            .iter()
            .zip(slices.iter())
            .map(|((name, _), values)| {
                let hint = self.config.types.get(name).copied();
                let bitfield_schema = self.config.bitfields.get(name).map(Vec::as_slice);
                select_codec(name, values, hint, bitfield_schema)
            })
            .collect::<Result<Vec<_>>>()?;

        let order = self.resolve_order(columns, &codecs, reused_order)?;
        let ordered_codecs: Vec<Codec> = order.iter().map(|&i| codecs[i].clone()).collect();
        let rows: Vec<Vec<Value>> = (0..(end - start)).map(|r| order.iter().map(|&i| slices[i][r].clone()).collect()).collect();

        let mut data = Vec::new();
        row::encode_rows(endian, &mut data, &ordered_codecs, &rows)?;

        let frame = Frame::new(endian, (end - start) as i64, Vec::new(), self.config.properties.clone(), ordered_codecs, data);
        frame.write(&mut self.sink)
    }

    fn resolve_order(&self, columns: &[(String, Vec<Value>)], codecs: &[Codec], reused_order: &mut Option<Vec<usize>>) -> Result<Vec<usize>> {
        if let Some(names) = &self.config.column_order {
            if names.len() != columns.len() {
                return Err(crate::result::Error::CorruptData(format!(
                    "column_order names {} columns but {} were written",
                    names.len(),
                    columns.len()
                )));
            }
            let order: Vec<usize> = names
                .iter()
                .map(|name| {
                    columns
                        .iter()
                        .position(|(n, _)| n == name)
                        .ok_or_else(|| crate::result::Error::UnknownColumn(name.clone()))
                })
                .collect::<Result<_>>()?;
            let distinct: std::collections::HashSet<usize> = order.iter().copied().collect();
            if distinct.len() != columns.len() {
                return Err(crate::result::Error::CorruptData(
                    "column_order names a column more than once, which would drop another column".to_string(),
                ));
            }
            return Ok(order);
        }
        if let Some(order) = reused_order {
            return Ok(order.clone());
        }
        let mut order: Vec<usize> = (0..codecs.len()).collect();
        order.sort_by_key(|&i| (codecs[i].num_changes(), i));
        *reused_order = Some(order.clone());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    #[test]
    fn writes_and_reads_back_a_single_frame() {
        let columns = vec![
            ("a".to_string(), vec![Value::Integer(1), Value::Integer(1), Value::Integer(2)]),
            ("b".to_string(), vec![Value::Str("x".into()), Value::Str("y".into()), Value::Str("y".into())]),
        ];
        let mut writer = Writer::new(Vec::new(), EncoderConfig::default());
        writer.write_columns(&columns).unwrap();
        let bytes = writer.into_inner();

        let reader = Reader::open(std::io::Cursor::new(bytes), false, 0).unwrap();
        assert_eq!(reader.frames().len(), 1);
        let decoded = reader.frames()[0].dataframe(None).unwrap();
        assert_eq!(decoded["a"], vec![Value::Integer(1), Value::Integer(1), Value::Integer(2)]);
        assert_eq!(decoded["b"], vec![Value::Str("x".into()), Value::Str("y".into()), Value::Str("y".into())]);
    }

    #[test]
    fn splits_large_batches_across_frames() {
        let values: Vec<Value> = (0..25).map(Value::Integer).collect();
        let columns = vec![("a".to_string(), values)];
        let config = EncoderConfig {
            rows_per_frame: 10,
            ..EncoderConfig::default()
        };
        let mut writer = Writer::new(Vec::new(), config);
        writer.write_columns(&columns).unwrap();
        let bytes = writer.into_inner();

        let reader = Reader::open(std::io::Cursor::new(bytes), false, 0).unwrap();
        assert_eq!(reader.frames().len(), 3);
        let aggregated = Reader::open(std::io::Cursor::new(reader_bytes(&columns)), true, 0).unwrap();
        assert_eq!(aggregated.frames().len(), 1);
        assert_eq!(aggregated.frames()[0].nrows(), 25);
    }

    fn reader_bytes(columns: &[(String, Vec<Value>)]) -> Vec<u8> {
        let config = EncoderConfig {
            rows_per_frame: 10,
            ..EncoderConfig::default()
        };
        let mut writer = Writer::new(Vec::new(), config);
        writer.write_columns(columns).unwrap();
        writer.into_inner()
    }

    #[test]
    fn a_second_write_columns_call_with_fewer_columns_does_not_reuse_stale_order() {
        let mut writer = Writer::new(Vec::new(), EncoderConfig::default());
        writer
            .write_columns(&[
                ("a".to_string(), vec![Value::Integer(1), Value::Integer(2)]),
                ("b".to_string(), vec![Value::Integer(3), Value::Integer(4)]),
                ("c".to_string(), vec![Value::Integer(5), Value::Integer(6)]),
            ])
            .unwrap();
        writer.write_columns(&[("a".to_string(), vec![Value::Integer(9)])]).unwrap();
        let bytes = writer.into_inner();

        let reader = Reader::open(std::io::Cursor::new(bytes), false, 0).unwrap();
        assert_eq!(reader.frames().len(), 2);
        assert_eq!(reader.frames()[1].dataframe(None).unwrap()["a"], vec![Value::Integer(9)]);
    }

    #[test]
    fn mismatched_column_lengths_are_rejected_instead_of_panicking() {
        let mut writer = Writer::new(Vec::new(), EncoderConfig::default());
        let err = writer
            .write_columns(&[
                ("a".to_string(), vec![Value::Integer(1); 10]),
                ("b".to_string(), vec![Value::Integer(2); 3]),
            ])
            .unwrap_err();
        assert_matches::assert_matches!(err, crate::result::Error::CorruptData(_));
    }

    #[test]
    fn column_order_missing_a_column_is_rejected_instead_of_dropping_it() {
        let config = EncoderConfig {
            column_order: Some(vec!["a".to_string()]),
            ..EncoderConfig::default()
        };
        let mut writer = Writer::new(Vec::new(), config);
        let err = writer
            .write_columns(&[
                ("a".to_string(), vec![Value::Integer(1)]),
                ("b".to_string(), vec![Value::Integer(2)]),
            ])
            .unwrap_err();
        assert_matches::assert_matches!(err, crate::result::Error::CorruptData(_));
    }

    #[test]
    fn column_order_naming_the_same_column_twice_is_rejected_instead_of_dropping_another() {
        let config = EncoderConfig {
            column_order: Some(vec!["a".to_string(), "a".to_string()]),
            ..EncoderConfig::default()
        };
        let mut writer = Writer::new(Vec::new(), config);
        let err = writer
            .write_columns(&[
                ("a".to_string(), vec![Value::Integer(1)]),
                ("b".to_string(), vec![Value::Integer(2)]),
            ])
            .unwrap_err();
        assert_matches::assert_matches!(err, crate::result::Error::CorruptData(_));
    }
}
