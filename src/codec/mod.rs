//! Binary decoders for Blood Pressure Service payloads.
//!
//! Every decoder is a pure function `&[u8] -> Result<_, DecodeError>`.
//! All multi-byte integers are little-endian.
//!
//! | Module          | Characteristic                     |
//! |-----------------|------------------------------------|
//! | [`sfloat`]      | IEEE-11073 16-bit SFLOAT            |
//! | [`feature`]     | Blood Pressure Feature (0x2A49)     |
//! | [`measurement`] | Blood Pressure Measurement (0x2A35) |
//! | [`record`]      | Blood Pressure Record (0x2B36)      |
//! | [`racp`]        | Record Access Control Point (0x2A52)|

pub mod feature;
pub mod hex;
pub mod measurement;
pub mod racp;
pub mod record;
pub mod sfloat;

pub use feature::{Feature, FeatureSet, decode_feature};
pub use hex::HexDump;
pub use measurement::{Measurement, PressureUnit, Timestamp, decode_measurement};
pub use racp::{RacpCommand, RacpOperator, RacpResponse, RacpResponseCode, decode_racp_response};
pub use record::{RecordFrameHeader, decode_record_header, split_record_frame};
pub use sfloat::{SfloatSentinel, decode_sfloat};

use crate::error::DecodeError;

/// Forward-only cursor over a payload. Every read checks the remaining
/// length and reports the total length the payload would have needed.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn take<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let end = self.pos + N;
        let chunk = self
            .bytes
            .get(self.pos..end)
            .ok_or(DecodeError::TooShort {
                needed: end,
                available: self.bytes.len(),
            })?;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        self.pos = end;
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, DecodeError> {
        let [b] = self.take::<1>()?;
        Ok(b)
    }

    pub(crate) fn u16_le(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.take::<2>()?))
    }

    /// Read one SFLOAT, logging if it is a reserved sentinel.
    pub(crate) fn sfloat(&mut self, field: &'static str) -> Result<f32, DecodeError> {
        let [b0, b1] = self.take::<2>()?;
        if let Some(sentinel) = SfloatSentinel::classify(b0, b1) {
            log::debug!("{field}: SFLOAT sentinel {sentinel:?} decoded as a plain value");
        }
        Ok(decode_sfloat(b0, b1))
    }

    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos.min(self.bytes.len())..]
    }
}
