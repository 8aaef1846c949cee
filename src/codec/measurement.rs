//! Blood Pressure Measurement (0x2A35).
//!
//! ```text
//! ┌───────┬──────────┬───────────┬─────┬───────────┬───────┬─────┬────────┐
//! │ flags │ systolic │ diastolic │ MAP │ timestamp │ pulse │ uid │ status │
//! │  u8   │  SFLOAT  │  SFLOAT   │SFLT │  7 bytes  │ SFLT  │ u8  │ u16 LE │
//! └───────┴──────────┴───────────┴─────┴───────────┴───────┴─────┴────────┘
//!                                       └──── present only when flagged ───┘
//! ```
//!
//! Optional fields appear in the fixed order above. A payload truncated
//! inside any flagged field is rejected as a whole.

use core::fmt;

use crate::codec::Reader;
use crate::error::DecodeError;

/// Flags byte plus three mandatory SFLOATs.
pub const MEASUREMENT_MIN_LEN: usize = 7;

const FLAG_UNIT_KPA: u8 = 0x01;
const FLAG_TIMESTAMP: u8 = 0x02;
const FLAG_PULSE_RATE: u8 = 0x04;
const FLAG_USER_ID: u8 = 0x08;
const FLAG_STATUS: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureUnit {
    MmHg,
    Kpa,
}

impl PressureUnit {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::MmHg => "mmHg",
            Self::Kpa => "kPa",
        }
    }
}

/// Date-time as carried on the wire. Fields are not range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Timestamp {
    pub const WIRE_LEN: usize = 7;

    fn read(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b = r.take::<{ Self::WIRE_LEN }>()?;
        Ok(Self {
            year: u16::from_le_bytes([b[0], b[1]]),
            month: b[2],
            day: b[3],
            hour: b[4],
            minute: b[5],
            second: b[6],
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub systolic: f32,
    pub diastolic: f32,
    pub mean_arterial_pressure: f32,
    pub unit: PressureUnit,
    pub timestamp: Option<Timestamp>,
    pub pulse_rate: Option<f32>,
    pub user_id: Option<u8>,
    pub status: Option<u16>,
}

pub fn decode_measurement(bytes: &[u8]) -> Result<Measurement, DecodeError> {
    if bytes.len() < MEASUREMENT_MIN_LEN {
        return Err(DecodeError::TooShort {
            needed: MEASUREMENT_MIN_LEN,
            available: bytes.len(),
        });
    }
    let mut r = Reader::new(bytes);
    let flags = r.u8()?;

    let systolic = r.sfloat("systolic")?;
    let diastolic = r.sfloat("diastolic")?;
    let mean_arterial_pressure = r.sfloat("mean arterial pressure")?;

    let timestamp = if flags & FLAG_TIMESTAMP != 0 {
        Some(Timestamp::read(&mut r)?)
    } else {
        None
    };
    let pulse_rate = if flags & FLAG_PULSE_RATE != 0 {
        Some(r.sfloat("pulse rate")?)
    } else {
        None
    };
    let user_id = if flags & FLAG_USER_ID != 0 {
        Some(r.u8()?)
    } else {
        None
    };
    let status = if flags & FLAG_STATUS != 0 {
        Some(r.u16_le()?)
    } else {
        None
    };

    Ok(Measurement {
        systolic,
        diastolic,
        mean_arterial_pressure,
        unit: if flags & FLAG_UNIT_KPA != 0 {
            PressureUnit::Kpa
        } else {
            PressureUnit::MmHg
        },
        timestamp,
        pulse_rate,
        user_id,
        status,
    })
}
