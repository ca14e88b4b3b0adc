//! Fixed, on-disk constants for the ODB-2 frame format.

pub const NEW_HEADER_MARKER: u16 = 65535;
pub const MAGIC: &[u8; 3] = b"ODA";
pub const ENDIAN_MARKER: u32 = 1;
pub const FORMAT_VERSION_MAJOR: u32 = 0;
pub const FORMAT_VERSION_MINOR: u32 = 5;

/// Integer missing-value sentinel, stored as a signed 64-bit value.
pub const MISSING_INTEGER: i64 = 2_147_483_647;

/// Canonical double missing-value sentinel written by this implementation.
pub const MISSING_REAL: f64 = -2_147_483_647.0;

/// Legacy bit pattern some ODB-1-migrated data uses for a "missing double" -
/// all-zero bytes. Accepted, never written, on decode.
pub const LEGACY_DOUBLE_MISSING_BITS: u64 = 0;

/// Short-real missing sentinel A: little-endian bytes `00 00 80 00`.
pub const SR_MISSING_A_BITS: u32 = 0x0080_0000;
/// Short-real missing sentinel B: little-endian bytes `FF FF 7F 7F`.
pub const SR_MISSING_B_BITS: u32 = 0x7f7f_ffff;

pub fn sr_missing_a() -> f32 {
    f32::from_bits(SR_MISSING_A_BITS)
}

pub fn sr_missing_b() -> f32 {
    f32::from_bits(SR_MISSING_B_BITS)
}

/// Eight NUL bytes - the on-disk representation of a missing string.
pub const STRING_MISSING: [u8; 8] = [0; 8];

/// Environment variable gating selection of `LongConstantString`.
pub const ENV_ENABLE_LONG_STRING_CODEC: &str = "ODC_ENABLE_WRITING_LONG_STRING_CODEC";

pub(crate) fn long_string_codec_enabled() -> bool {
    std::env::var(ENV_ENABLE_LONG_STRING_CODEC)
        .map(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
        .unwrap_or(false)
}
