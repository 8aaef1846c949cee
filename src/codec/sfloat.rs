//! IEEE-11073 16-bit SFLOAT.
//!
//! ```text
//!  15      12 11                     0
//! ┌──────────┬────────────────────────┐
//! │ exponent │        mantissa        │   value = mantissa × 10^exponent
//! │ 4b signed│       12b signed       │
//! └──────────┴────────────────────────┘
//! ```
//!
//! Reserved bit patterns (NaN, NRes, ±INF, reserved) are *not* special-cased
//! by [`decode_sfloat`]: they come out as the ordinary numbers their bits
//! spell (0x07FF → 2047.0, 0x0800 → −2048.0, …). Callers that care can ask
//! [`SfloatSentinel::classify`].

/// Decode a little-endian SFLOAT from its two wire bytes.
pub fn decode_sfloat(b0: u8, b1: u8) -> f32 {
    let raw = u16::from_le_bytes([b0, b1]);
    let mantissa = sign_extend(raw & 0x0FFF, 12);
    let exponent = sign_extend(raw >> 12, 4);
    (f64::from(mantissa) * 10f64.powi(exponent)) as f32
}

fn sign_extend(value: u16, bits: u32) -> i32 {
    let shift = 32 - bits;
    (i32::from(value) << shift) >> shift
}

/// Reserved SFLOAT values (exponent 0, special mantissa).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SfloatSentinel {
    /// Not a Number, 0x07FF
    NaN,
    /// Not at this Resolution, 0x0800
    NRes,
    /// +INFINITY, 0x07FE
    PositiveInfinity,
    /// −INFINITY, 0x0802
    NegativeInfinity,
    /// Reserved for future use, 0x0801
    Reserved,
}

impl SfloatSentinel {
    pub const fn classify(b0: u8, b1: u8) -> Option<Self> {
        match u16::from_le_bytes([b0, b1]) {
            0x07FF => Some(Self::NaN),
            0x0800 => Some(Self::NRes),
            0x07FE => Some(Self::PositiveInfinity),
            0x0802 => Some(Self::NegativeInfinity),
            0x0801 => Some(Self::Reserved),
            _ => None,
        }
    }
}
