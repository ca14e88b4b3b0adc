use std::io::Cursor;

use odb2::config::EncoderConfig;
use odb2::reader::Reader;
use odb2::writer::Writer;
use odb2::{DataType, Value};

fn round_trip(columns: Vec<(String, Vec<Value>)>, config: EncoderConfig) -> odb2::Frame {
    let _ = tracing_subscriber::fmt().with_test_writer().with_env_filter("odb2=debug").try_init();
    let mut writer = Writer::new(Vec::new(), config);
    writer.write_columns(&columns).unwrap();
    let bytes = writer.into_inner();
    let reader = Reader::open(Cursor::new(bytes), true, 0).unwrap();
    assert_eq!(reader.frames().len(), 1);
    reader.into_frames().remove(0)
}

#[test]
fn integer_constant_column_uses_zero_byte_storage() {
    let values = vec![Value::Integer(73); 7];
    let frame = round_trip(vec![("obs".to_string(), values.clone())], EncoderConfig::default());
    let decoded = frame.dataframe(None).unwrap();
    assert_eq!(decoded["obs"], values);
}

#[test]
fn mixed_integer_with_nulls_selects_int8_missing() {
    let values = vec![
        Value::Integer(1),
        Value::Missing,
        Value::Integer(3),
        Value::Integer(4),
        Value::Integer(5),
        Value::Missing,
        Value::Integer(7),
    ];
    let frame = round_trip(vec![("obs".to_string(), values.clone())], EncoderConfig::default());
    let decoded = frame.dataframe(None).unwrap();
    assert_eq!(decoded["obs"], values);
}

#[test]
fn long_real_column_round_trips_bit_exact() {
    let values: Vec<Value> = [999.99, 888.88, 777.77, 666.66, 555.55, 444.44, 333.33].iter().map(|v| Value::Real(*v)).collect();
    let frame = round_trip(vec![("obs".to_string(), values.clone())], EncoderConfig::default());
    let decoded = frame.dataframe(None).unwrap();
    assert_eq!(decoded["obs"], values);
}

#[test]
fn string_dictionary_column_round_trips() {
    let raw = ["aoeu", "aoeu", "aaaaaaaooooooo", "None", "boo", "squiggle", "a"];
    let values: Vec<Value> = raw.iter().map(|s| Value::Str(s.to_string())).collect();
    let frame = round_trip(vec![("station".to_string(), values.clone())], EncoderConfig::default());
    assert_eq!(frame.dataframe(None).unwrap()["station"], values);
}

#[test]
fn row_delta_skips_constant_column_after_first_row() {
    let col0 = vec![Value::Str("x".to_string()); 3];
    let col1 = vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)];
    let frame = round_trip(
        vec![("site".to_string(), col0.clone()), ("reading".to_string(), col1.clone())],
        EncoderConfig::default(),
    );
    let decoded = frame.dataframe(None).unwrap();
    assert_eq!(decoded["site"], col0);
    assert_eq!(decoded["reading"], col1);
}

#[test]
fn bitfield_subcolumns_are_synthesized_on_decode() {
    let mut config = EncoderConfig::default();
    config.bitfields.insert("flags".to_string(), vec![("quality".to_string(), 3), ("source".to_string(), 5)]);
    let packed: Vec<Value> = [0b00101i64, 0b11010, 0b00000].into_iter().map(Value::Integer).collect();
    let frame = round_trip(vec![("flags".to_string(), packed)], config);

    let decoded = frame.dataframe(Some(&["flags.quality", "flags.source"])).unwrap();
    assert_eq!(decoded["flags.quality"], vec![Value::Integer(0b101), Value::Integer(0b010), Value::Integer(0)]);
    assert_eq!(decoded["flags.source"], vec![Value::Integer(0b000), Value::Integer(0b011), Value::Integer(0)]);

    let columns = frame.columns();
    assert_eq!(columns[0].dtype, DataType::Bitfield);
    assert_eq!(columns[0].bitfields.len(), 2);
}

#[test]
fn splitting_into_multiple_frames_and_aggregating_matches_one_big_frame() {
    let values: Vec<Value> = (0..250).map(Value::Integer).collect();
    let config = EncoderConfig {
        rows_per_frame: 64,
        ..EncoderConfig::default()
    };
    let mut writer = Writer::new(Vec::new(), config);
    writer.write_columns(&[("a".to_string(), values.clone())]).unwrap();
    let bytes = writer.into_inner();

    let unaggregated = Reader::open(Cursor::new(bytes.clone()), false, 0).unwrap();
    assert_eq!(unaggregated.frames().len(), 4);

    let aggregated = Reader::open(Cursor::new(bytes), true, 0).unwrap();
    assert_eq!(aggregated.frames().len(), 1);
    let decoded = aggregated.frames()[0].dataframe(None).unwrap();
    assert_eq!(decoded["a"], values);
}

#[test]
fn ambiguous_short_column_name_is_rejected() {
    let values = vec![Value::Integer(1), Value::Integer(2)];
    let frame = round_trip(
        vec![("lat@hdr".to_string(), values.clone()), ("lat@body".to_string(), values)],
        EncoderConfig::default(),
    );
    let err = frame.dataframe(Some(&["lat"])).unwrap_err();
    assert_matches::assert_matches!(err, odb2::Error::AmbiguousColumn(_));
}

