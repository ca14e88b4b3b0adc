//! Encoder configuration.

use std::collections::HashMap;

use crate::column::DataType;

/// Options accepted by [`crate::writer::Writer`].
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub rows_per_frame: usize,
    pub types: HashMap<String, DataType>,
    pub bitfields: HashMap<String, Vec<(String, u8)>>,
    pub properties: Vec<(String, String)>,
    pub bigendian: bool,
    pub column_order: Option<Vec<String>>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            rows_per_frame: 10_000,
            types: HashMap::new(),
            bitfields: HashMap::new(),
            properties: Vec::new(),
            bigendian: false,
            column_order: None,
        }
    }
}


