//! Blood Pressure Record (0x2B36) segmentation header.
//!
//! ```text
//!  byte 0                 1..=2            3..=4          5..
//! ┌───┬───┬──────────┐ ┌──────────────┐ ┌──────────────┐ ┌─────────┐
//! │ F │ L │ counter  │ │ sequence LE  │ │ uuid16 LE    │ │ payload │
//! │b7 │b6 │  b0..b5  │ └──────────────┘ └──────────────┘ └─────────┘
//! └───┴───┴──────────┘
//! ```
//!
//! Segments are not reassembled; each frame is surfaced on its own.

use crate::codec::Reader;
use crate::error::DecodeError;

pub const RECORD_HEADER_LEN: usize = 5;

const FIRST_SEGMENT: u8 = 0x80;
const LAST_SEGMENT: u8 = 0x40;
const SEGMENT_COUNTER_MASK: u8 = 0x3F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFrameHeader {
    pub is_first_segment: bool,
    pub is_last_segment: bool,
    /// Rolling segment counter, 0..=63.
    pub segment_counter: u8,
    pub sequence_number: u16,
    /// 16-bit UUID of the characteristic value embedded in the payload.
    pub embedded_type_uuid16: u16,
    pub payload_length: usize,
}

impl RecordFrameHeader {
    /// First and last flags both set: the payload is a complete value.
    pub const fn is_single_segment(&self) -> bool {
        self.is_first_segment && self.is_last_segment
    }
}

pub fn decode_record_header(bytes: &[u8]) -> Result<RecordFrameHeader, DecodeError> {
    split_record_frame(bytes).map(|(header, _)| header)
}

/// Decode the header and hand back the payload that follows it.
pub fn split_record_frame(bytes: &[u8]) -> Result<(RecordFrameHeader, &[u8]), DecodeError> {
    if bytes.len() < RECORD_HEADER_LEN {
        return Err(DecodeError::TooShort {
            needed: RECORD_HEADER_LEN,
            available: bytes.len(),
        });
    }
    let mut r = Reader::new(bytes);
    let segmentation = r.u8()?;
    let sequence_number = r.u16_le()?;
    let embedded_type_uuid16 = r.u16_le()?;
    let payload = r.rest();

    let header = RecordFrameHeader {
        is_first_segment: segmentation & FIRST_SEGMENT != 0,
        is_last_segment: segmentation & LAST_SEGMENT != 0,
        segment_counter: segmentation & SEGMENT_COUNTER_MASK,
        sequence_number,
        embedded_type_uuid16,
        payload_length: payload.len(),
    };
    Ok((header, payload))
}
