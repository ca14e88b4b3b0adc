//! Encoder/decoder for ODB-2, a self-describing columnar binary format used
//! for meteorological observation archives. A file is zero or more
//! concatenated frames; within a frame, row-delta encoding means only the
//! columns that changed since the previous row are written, preceded by a
//! start-column marker.
//!
//! ```no_run
//! use odb2::{column::Value, config::EncoderConfig, reader::Reader, writer::Writer};
//!
//! let columns = vec![("temperature".to_string(), vec![Value::Real(288.15); 3])];
//! let mut writer = Writer::new(Vec::new(), EncoderConfig::default());
//! writer.write_columns(&columns).unwrap();
//!
//! let bytes = writer.into_inner();
//! let reader = Reader::open(std::io::Cursor::new(bytes), true, 0).unwrap();
//! for frame in reader.frames() {
//!     let _decoded = frame.dataframe(None).unwrap();
//! }
//! ```

pub mod codec;
pub mod column;
pub mod config;
mod constants;
pub mod frame;
pub mod reader;
pub mod result;
mod row;
mod stream;
mod utils;
pub mod writer;

pub use column::{DataType, Value};
pub use frame::Frame;
pub use reader::Reader;
pub use result::{Error, Result};
pub use writer::Writer;


