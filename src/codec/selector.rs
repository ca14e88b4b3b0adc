//! Deterministic codec selection: given a column's source values and an
//! optional type hint, picks the cheapest codec able to represent them
//! losslessly. Two conforming implementations fed the same
//! column must produce the same codec class and parameters, so this walks
//! the applicability tables top-to-bottom rather than branching on
//! heuristics.

use std::collections::HashSet;

use crate::codec::bitfield::BitfieldCodec;
use crate::codec::integer::{IntegerCodec, IntegerShape};
use crate::codec::real::{RealCodec, RealShape};
use crate::codec::string::{ConstantStringCodec, DictionaryStringCodec, LongConstantStringCodec};
use crate::codec::Codec;
use crate::column::{DataType, Value};
use crate::constants::{long_string_codec_enabled, sr_missing_a, sr_missing_b};
use crate::result::{Error, Result};

pub fn select_codec(
    column_name: &str,
    values: &[Value],
    hint: Option<DataType>,
    bitfield_schema: Option<&[(String, u8)]>,
) -> Result<Codec> {
    let num_changes = count_changes(values);
    let dtype = bitfield_schema.map(|_| DataType::Bitfield).unwrap_or_else(|| effective_dtype(values, hint));

    match dtype {
        DataType::Bitfield => {
            let schema = bitfield_schema.ok_or_else(|| Error::CorruptData(format!("column '{column_name}' has no bitfield schema")))?;
            let storage = select_integer_storage(column_name, values, num_changes)?;
            Ok(Codec::Bitfield(BitfieldCodec::new(storage, schema.to_vec())?))
        }
        DataType::Integer => Ok(Codec::Integer(select_integer_storage(column_name, values, num_changes)?)),
        DataType::Real | DataType::Double => select_real(column_name, values, dtype, num_changes),
        DataType::String => select_string(column_name, values, num_changes),
        DataType::Ignore => Err(Error::CorruptData(format!("column '{column_name}' has no storable type"))),
    }
}

fn effective_dtype(values: &[Value], hint: Option<DataType>) -> DataType {
    if let Some(h) = hint {
        return h;
    }
    if values.iter().any(|v| matches!(v, Value::Str(_))) {
        return DataType::String;
    }
    if values.iter().any(|v| matches!(v, Value::Real(_))) {
        let all_integral = values.iter().all(|v| match v {
            Value::Real(r) => r.fract() == 0.0,
            Value::Integer(_) | Value::Missing => true,
            _ => false,
        });
        return if all_integral { DataType::Integer } else { DataType::Double };
    }
    DataType::Integer
}

fn count_changes(values: &[Value]) -> u64 {
    values.windows(2).filter(|w| w[0] != w[1]).count() as u64
}

fn select_integer_storage(column_name: &str, values: &[Value], num_changes: u64) -> Result<IntegerCodec> {
    let has_missing = values.iter().any(Value::is_missing);
    let non_missing_count = values.iter().filter(|v| !v.is_missing()).count();
    let as_ints: Vec<i64> = values.iter().filter_map(Value::as_integer).collect();
    if as_ints.len() != non_missing_count {
        return Err(Error::CorruptData(format!("column '{column_name}' was selected as integer but holds a non-integer value")));
    }
    let (min, max) = as_ints
        .iter()
        .fold(None, |acc: Option<(i64, i64)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .unwrap_or((0, 0));

    let span = max.checked_sub(min).ok_or(Error::UnsupportedRange)?;
    let shape = if min == max {
        if has_missing {
            IntegerShape::ConstantOrMissing
        } else {
            IntegerShape::Constant
        }
    } else if span <= 0xFF && !has_missing {
        IntegerShape::Int8
    } else if span <= 0xFE && has_missing {
        IntegerShape::Int8Missing
    } else if span <= 0xFFFF && !has_missing {
        IntegerShape::Int16
    } else if span <= 0xFFFE && has_missing {
        IntegerShape::Int16Missing
    } else if min >= i32::MIN as i64 && max < i32::MAX as i64 {
        // i32::MAX is reserved as Int32's missing-value sentinel (the shape
        // has no separate non-missing variant), so it can't be a genuine max.
        IntegerShape::Int32
    } else {
        return Err(Error::UnsupportedRange);
    };

    Ok(IntegerCodec::new(column_name.to_string(), shape, min, max, num_changes))
}

fn select_real(column_name: &str, values: &[Value], dtype: DataType, num_changes: u64) -> Result<Codec> {
    let has_missing = values.iter().any(Value::is_missing);
    let non_missing_count = values.iter().filter(|v| !v.is_missing()).count();
    let non_missing: Vec<f64> = values.iter().filter_map(Value::as_real).collect();
    if non_missing.len() != non_missing_count {
        return Err(Error::CorruptData(format!("column '{column_name}' was selected as real but holds a non-real value")));
    }
    let all_equal = non_missing.windows(2).all(|w| w[0] == w[1]);

    if all_equal && !has_missing {
        let value = non_missing.first().copied().unwrap_or(0.0);
        return Ok(Codec::Real(RealCodec::new(column_name.to_string(), RealShape::Constant, value, value, num_changes)));
    }
    if all_equal {
        let value = non_missing.first().copied().unwrap_or(0.0);
        return Ok(Codec::Real(RealCodec::new(
            column_name.to_string(),
            RealShape::ConstantOrMissing,
            value,
            value,
            num_changes,
        )));
    }

    let min = non_missing.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = non_missing.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let fits_f32 = dtype != DataType::Double && non_missing.iter().all(|v| (*v as f32) as f64 == *v);
    if fits_f32 {
        let uses_a = non_missing.iter().any(|v| (*v as f32).to_bits() == sr_missing_a().to_bits());
        let uses_b = non_missing.iter().any(|v| (*v as f32).to_bits() == sr_missing_b().to_bits());
        if !uses_a {
            return Ok(Codec::Real(RealCodec::new(column_name.to_string(), RealShape::ShortReal2, min, max, num_changes)));
        }
        if !uses_b {
            return Ok(Codec::Real(RealCodec::new(column_name.to_string(), RealShape::ShortReal, min, max, num_changes)));
        }
    }

    Ok(Codec::Real(RealCodec::new(column_name.to_string(), RealShape::LongReal, min, max, num_changes)))
}

fn select_string(column_name: &str, values: &[Value], num_changes: u64) -> Result<Codec> {
    let rendered: Vec<String> = values
        .iter()
        .map(|v| match v {
            Value::Str(s) => Ok(s.clone()),
            Value::Missing => Ok(String::new()),
            _ => Err(Error::CorruptData(format!("column '{column_name}' was selected as string but holds a non-string value"))),
        })
        .collect::<Result<_>>()?;
    let unique: HashSet<&String> = rendered.iter().collect();

    if unique.len() == 1 {
        let value = rendered[0].clone();
        if value.len() > 8 && long_string_codec_enabled() {
            return Ok(Codec::LongConstantString(LongConstantStringCodec::new(column_name.to_string(), value, num_changes)));
        }
        if value.len() <= 8 {
            return Ok(Codec::ConstantString(ConstantStringCodec::new(column_name.to_string(), value, num_changes)));
        }
    }

    let mut dictionary: Vec<String> = unique.into_iter().cloned().collect();
    dictionary.sort();
    if dictionary.len() <= 256 {
        return Ok(Codec::DictionaryString(DictionaryStringCodec::new(column_name.to_string(), false, dictionary, num_changes)));
    }
    if dictionary.len() < 65536 {
        return Ok(Codec::DictionaryString(DictionaryStringCodec::new(column_name.to_string(), true, dictionary, num_changes)));
    }
    Err(Error::UnsupportedRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_wins_tie_break_over_int8() {
        let values = vec![Value::Integer(5); 4];
        let codec = select_codec("x", &values, None, None).unwrap();
        match codec {
            Codec::Integer(c) => assert_eq!(c.shape, IntegerShape::Constant),
            _ => panic!("expected integer codec"),
        }
    }

    #[test]
    fn missing_integer_column_picks_missing_variant() {
        let values = vec![Value::Integer(1), Value::Missing, Value::Integer(200)];
        let codec = select_codec("x", &values, None, None).unwrap();
        match codec {
            Codec::Integer(c) => assert_eq!(c.shape, IntegerShape::Int16Missing),
            _ => panic!("expected integer codec"),
        }
    }

    #[test]
    fn float_column_without_hint_and_all_integral_values_selects_integer() {
        let values = vec![Value::Real(1.0), Value::Real(2.0), Value::Real(3.0)];
        let codec = select_codec("x", &values, None, None).unwrap();
        assert_eq!(codec.data_type(), DataType::Integer);
    }

    #[test]
    fn single_short_string_selects_constant_string() {
        let values = vec![Value::Str("hi".into()); 3];
        let codec = select_codec("x", &values, None, None).unwrap();
        match codec {
            Codec::ConstantString(_) => {}
            _ => panic!("expected constant string codec"),
        }
    }

    #[test]
    fn i32_max_is_excluded_from_int32_range_to_avoid_colliding_with_its_missing_sentinel() {
        let values = vec![Value::Integer(i32::MIN as i64), Value::Integer(i32::MAX as i64 - 1)];
        let codec = select_codec("x", &values, None, None).unwrap();
        match codec {
            Codec::Integer(c) => assert_eq!(c.shape, IntegerShape::Int32),
            _ => panic!("expected integer codec"),
        }

        let values = vec![Value::Integer(i32::MIN as i64), Value::Integer(i32::MAX as i64)];
        let err = select_codec("x", &values, None, None).unwrap_err();
        assert_matches::assert_matches!(err, Error::UnsupportedRange);
    }

    #[test]
    fn integer_hint_on_string_values_is_corrupt_data_not_a_silent_zero() {
        let values = vec![Value::Str("not a number".into()), Value::Str("also not".into())];
        let err = select_codec("x", &values, Some(DataType::Integer), None).unwrap_err();
        assert_matches::assert_matches!(err, Error::CorruptData(_));
    }

    #[test]
    fn real_hint_on_string_values_is_corrupt_data_not_a_silent_zero() {
        let values = vec![Value::Str("not a number".into()), Value::Str("also not".into())];
        let err = select_codec("x", &values, Some(DataType::Real), None).unwrap_err();
        assert_matches::assert_matches!(err, Error::CorruptData(_));
    }

    #[test]
    fn all_integral_real_beyond_i64_range_is_corrupt_data_not_a_silent_truncation() {
        let values = vec![Value::Real(1e20), Value::Real(2e20)];
        let err = select_codec("x", &values, None, None).unwrap_err();
        assert_matches::assert_matches!(err, Error::CorruptData(_));
    }

    #[test]
    fn string_hint_on_numeric_values_is_corrupt_data_not_a_silent_empty_string() {
        let values = vec![Value::Integer(1), Value::Integer(2)];
        let err = select_codec("x", &values, Some(DataType::String), None).unwrap_err();
        assert_matches::assert_matches!(err, Error::CorruptData(_));
    }

    #[test]
    fn mixed_integer_and_whole_valued_real_entries_without_a_hint_select_integer() {
        let values = vec![Value::Integer(5), Value::Real(3.0), Value::Missing];
        let codec = select_codec("x", &values, None, None).unwrap();
        assert_eq!(codec.data_type(), DataType::Integer);
    }
}
