use thiserror::Error;

pub type Result<A, E = Error> = std::result::Result<A, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Declio(#[from] declio::Error),
    #[error("string is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("bad frame magic")]
    BadMagic,
    #[error("unsupported format version {0}.{1}")]
    UnsupportedVersion(u32, u32),
    #[error("MD5 checksum of header part 2 did not match header part 1")]
    ChecksumMismatch,
    #[error("unknown codec '{0}'")]
    UnknownCodec(String),
    #[error("value range cannot be represented by any known codec")]
    UnsupportedRange,
    #[error("short column name '{0}' is ambiguous across tables")]
    AmbiguousColumn(String),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("frames have incompatible column sets and cannot be aggregated")]
    MismatchedFrames,
    #[error("corrupt data: {0}")]
    CorruptData(String),
}
