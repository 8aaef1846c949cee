//! Blood Pressure Feature (0x2A49).
//!
//! A 16-bit little-endian bitmask of the capabilities the sensor supports.
//! Bits above 0x0020 are reserved; they are kept in the raw value but not
//! named.

use core::fmt;

use crate::codec::Reader;
use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Feature {
    BodyMovementDetection = 0x0001,
    CuffFitDetection = 0x0002,
    IrregularPulseDetection = 0x0004,
    PulseRateRangeDetection = 0x0008,
    MeasurementPositionDetection = 0x0010,
    MultipleBond = 0x0020,
}

impl Feature {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::BodyMovementDetection,
        Self::CuffFitDetection,
        Self::IrregularPulseDetection,
        Self::PulseRateRangeDetection,
        Self::MeasurementPositionDetection,
        Self::MultipleBond,
    ];

    pub const fn mask(self) -> u16 {
        self as u16
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::BodyMovementDetection => "Body Movement Detection",
            Self::CuffFitDetection => "Cuff Fit Detection",
            Self::IrregularPulseDetection => "Irregular Pulse Detection",
            Self::PulseRateRangeDetection => "Pulse Rate Range Detection",
            Self::MeasurementPositionDetection => "Measurement Position Detection",
            Self::MultipleBond => "Multiple Bond",
        }
    }
}

/// Decoded capability set. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureSet {
    raw: u16,
}

impl FeatureSet {
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    /// The raw bitmask, including reserved bits.
    pub const fn raw(self) -> u16 {
        self.raw
    }

    pub const fn contains(self, feature: Feature) -> bool {
        self.raw & feature.mask() != 0
    }

    /// No known capability bit is set.
    pub fn is_empty(self) -> bool {
        self.iter().next().is_none()
    }

    pub fn iter(self) -> impl Iterator<Item = Feature> {
        Feature::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    pub fn features(self) -> heapless::Vec<Feature, { Feature::COUNT }> {
        self.iter().collect()
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X} (", self.raw)?;
        if self.is_empty() {
            f.write_str("no flags")?;
        }
        for (i, feature) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(feature.name())?;
        }
        f.write_str(")")
    }
}

/// Decode the Feature characteristic. Extra bytes are ignored.
pub fn decode_feature(bytes: &[u8]) -> Result<FeatureSet, DecodeError> {
    let raw = Reader::new(bytes).u16_le()?;
    Ok(FeatureSet::from_raw(raw))
}
