//! GATT profile table for the Blood Pressure Service.
//!
//! UUID constants, declared characteristic properties and the resolution of
//! a discovered characteristic list into the four roles the client drives.

use core::fmt;

use log::info;
use uuid::Uuid;

/// Bluetooth SIG base UUID: `0000xxxx-0000-1000-8000-00805f9b34fb`.
pub const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5f9b_34fb;

/// Expand a 16-bit SIG-assigned UUID onto the base UUID.
pub const fn uuid_from_u16(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
}

/// Inverse of [`uuid_from_u16`]; `None` for vendor UUIDs and for SIG UUIDs
/// outside the 16-bit range.
pub fn short_uuid(uuid: &Uuid) -> Option<u16> {
    let raw = uuid.as_u128();
    let short_mask = 0xFFFF_FFFFu128 << 96;
    if raw & !short_mask != BLUETOOTH_BASE_UUID || raw >> 112 != 0 {
        return None;
    }
    Some((raw >> 96) as u16)
}

/// 16-bit assigned numbers.
pub mod uuid16 {
    pub const BLOOD_PRESSURE_SERVICE: u16 = 0x1810;
    pub const BLOOD_PRESSURE_MEASUREMENT: u16 = 0x2A35;
    pub const BLOOD_PRESSURE_FEATURE: u16 = 0x2A49;
    pub const RECORD_ACCESS_CONTROL_POINT: u16 = 0x2A52;
    pub const BLOOD_PRESSURE_RECORD: u16 = 0x2B36;
    pub const CLIENT_CHARACTERISTIC_CONFIG: u16 = 0x2902;
}

pub const BLOOD_PRESSURE_SERVICE_UUID: Uuid = uuid_from_u16(uuid16::BLOOD_PRESSURE_SERVICE);
pub const MEASUREMENT_UUID: Uuid = uuid_from_u16(uuid16::BLOOD_PRESSURE_MEASUREMENT);
pub const FEATURE_UUID: Uuid = uuid_from_u16(uuid16::BLOOD_PRESSURE_FEATURE);
pub const RACP_UUID: Uuid = uuid_from_u16(uuid16::RECORD_ACCESS_CONTROL_POINT);
pub const RECORD_UUID: Uuid = uuid_from_u16(uuid16::BLOOD_PRESSURE_RECORD);
pub const CCCD_UUID: Uuid = uuid_from_u16(uuid16::CLIENT_CHARACTERISTIC_CONFIG);

/// CCCD value enabling indications.
pub const CCCD_ENABLE_INDICATION: [u8; 2] = [0x02, 0x00];
/// CCCD value enabling notifications.
pub const CCCD_ENABLE_NOTIFICATION: [u8; 2] = [0x01, 0x00];

// ─── Characteristic references ───────────────────────────────────────────

/// Opaque transport handle naming one characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharHandle(pub u16);

impl fmt::Display for CharHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Declared characteristic properties, using the GATT properties bit
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharProperties(u8);

impl CharProperties {
    pub const READ: Self = Self(0x02);
    pub const WRITE: Self = Self(0x08);
    pub const NOTIFY: Self = Self(0x10);
    pub const INDICATE: Self = Self(0x20);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn readable(self) -> bool {
        self.contains(Self::READ)
    }
}

impl core::ops::BitOr for CharProperties {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.with(rhs)
    }
}

/// A characteristic as reported by service discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicRef {
    pub handle: CharHandle,
    pub uuid: Uuid,
    pub properties: CharProperties,
}

impl CharacteristicRef {
    pub const fn new(handle: CharHandle, uuid: Uuid, properties: CharProperties) -> Self {
        Self {
            handle,
            uuid,
            properties,
        }
    }
}

// ─── Roles ───────────────────────────────────────────────────────────────

/// The part a characteristic plays in the Blood Pressure flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicRole {
    Measurement,
    Feature,
    Racp,
    Record,
}

impl CharacteristicRole {
    pub const ALL: [Self; 4] = [Self::Measurement, Self::Feature, Self::Racp, Self::Record];

    pub const fn uuid(self) -> Uuid {
        match self {
            Self::Measurement => MEASUREMENT_UUID,
            Self::Feature => FEATURE_UUID,
            Self::Racp => RACP_UUID,
            Self::Record => RECORD_UUID,
        }
    }

    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.uuid() == *uuid)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Measurement => "Blood Pressure Measurement",
            Self::Feature => "Blood Pressure Feature",
            Self::Racp => "Record Access Control Point",
            Self::Record => "Blood Pressure Record",
        }
    }
}

impl fmt::Display for CharacteristicRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The four characteristics of interest, resolved once after discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedCharacteristics {
    pub measurement: Option<CharacteristicRef>,
    pub feature: Option<CharacteristicRef>,
    pub racp: Option<CharacteristicRef>,
    pub record: Option<CharacteristicRef>,
}

impl ResolvedCharacteristics {
    /// Pick the first characteristic matching each role's UUID.
    pub fn resolve(discovered: &[CharacteristicRef]) -> Self {
        let mut resolved = Self::default();
        for c in discovered {
            let Some(role) = CharacteristicRole::from_uuid(&c.uuid) else {
                continue;
            };
            let slot = resolved.slot_mut(role);
            if slot.is_none() {
                *slot = Some(*c);
            }
        }
        for role in CharacteristicRole::ALL {
            let status = if resolved.get(role).is_some() {
                "FOUND"
            } else {
                "NOT FOUND"
            };
            info!("{role}: {status}");
        }
        resolved
    }

    pub const fn get(&self, role: CharacteristicRole) -> Option<CharacteristicRef> {
        match role {
            CharacteristicRole::Measurement => self.measurement,
            CharacteristicRole::Feature => self.feature,
            CharacteristicRole::Racp => self.racp,
            CharacteristicRole::Record => self.record,
        }
    }

    fn slot_mut(&mut self, role: CharacteristicRole) -> &mut Option<CharacteristicRef> {
        match role {
            CharacteristicRole::Measurement => &mut self.measurement,
            CharacteristicRole::Feature => &mut self.feature,
            CharacteristicRole::Racp => &mut self.racp,
            CharacteristicRole::Record => &mut self.record,
        }
    }

    pub fn handle(&self, role: CharacteristicRole) -> Option<CharHandle> {
        self.get(role).map(|c| c.handle)
    }

    /// Which role, if any, the handle was resolved to.
    pub fn role_of(&self, handle: CharHandle) -> Option<CharacteristicRole> {
        CharacteristicRole::ALL
            .into_iter()
            .find(|role| self.handle(*role) == Some(handle))
    }

    /// RACP and Record are both required for the stored-record flow.
    pub const fn record_flow_available(&self) -> bool {
        self.racp.is_some() && self.record.is_some()
    }
}
