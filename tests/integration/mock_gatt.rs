//! Mock GATT transport and event sink for integration tests.
//!
//! Records every transport call and every emitted event so tests can
//! assert on the full history without a radio.

use std::time::Duration;

use bpmon::app::events::AppEvent;
use bpmon::app::ports::{EventSink, GattTransport, SettleTimer};
use bpmon::app::service::BpsService;
use bpmon::config::SessionConfig;
use bpmon::error::TransportError;
use bpmon::events::{GattEvent, GattStatus};
use bpmon::fsm::SubscriptionState;
use bpmon::gatt::{
    CharHandle, CharProperties, CharacteristicRef, FEATURE_UUID, MEASUREMENT_UUID, RACP_UUID,
    RECORD_UUID, uuid_from_u16,
};

pub const MEAS: CharHandle = CharHandle(0x21);
pub const FEAT: CharHandle = CharHandle(0x24);
pub const RACP: CharHandle = CharHandle(0x27);
pub const REC: CharHandle = CharHandle(0x2A);
pub const OTHER: CharHandle = CharHandle(0x30);

// ── Transport call record ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattCall {
    Read(CharHandle),
    WriteDescriptor(CharHandle, Vec<u8>),
    WriteCharacteristic(CharHandle, Vec<u8>),
    SettleTimer { delay: Duration, epoch: u32 },
}

impl GattCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::WriteDescriptor(..) | Self::WriteCharacteristic(..)
        )
    }
}

// ── MockGatt ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockGatt {
    pub calls: Vec<GattCall>,
    /// Refuse any operation on this handle with the given error.
    pub refuse: Option<(CharHandle, TransportError)>,
}

#[allow(dead_code)]
impl MockGatt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing(handle: CharHandle, error: TransportError) -> Self {
        Self {
            calls: Vec::new(),
            refuse: Some((handle, error)),
        }
    }

    pub fn writes(&self) -> Vec<GattCall> {
        self.calls.iter().filter(|c| c.is_write()).cloned().collect()
    }

    pub fn last_call(&self) -> Option<&GattCall> {
        self.calls.last()
    }

    fn check(&self, handle: CharHandle) -> Result<(), TransportError> {
        match self.refuse {
            Some((refused, error)) if refused == handle => Err(error),
            _ => Ok(()),
        }
    }
}

impl GattTransport for MockGatt {
    fn read_characteristic(&mut self, characteristic: CharHandle) -> Result<(), TransportError> {
        self.check(characteristic)?;
        self.calls.push(GattCall::Read(characteristic));
        Ok(())
    }

    fn write_descriptor(
        &mut self,
        characteristic: CharHandle,
        value: &[u8],
    ) -> Result<(), TransportError> {
        self.check(characteristic)?;
        self.calls
            .push(GattCall::WriteDescriptor(characteristic, value.to_vec()));
        Ok(())
    }

    fn write_characteristic(
        &mut self,
        characteristic: CharHandle,
        value: &[u8],
    ) -> Result<(), TransportError> {
        self.check(characteristic)?;
        self.calls
            .push(GattCall::WriteCharacteristic(characteristic, value.to_vec()));
        Ok(())
    }
}

impl SettleTimer for MockGatt {
    fn start_settle_timer(&mut self, delay: Duration, epoch: u32) {
        self.calls.push(GattCall::SettleTimer { delay, epoch });
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> Vec<(SubscriptionState, SubscriptionState)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixtures ──────────────────────────────────────────────────

/// Measurement, Feature, RACP and Record plus an unrelated
/// characteristic, as a blood pressure cuff would report them.
pub fn full_profile() -> Vec<CharacteristicRef> {
    vec![
        CharacteristicRef::new(MEAS, MEASUREMENT_UUID, CharProperties::INDICATE),
        CharacteristicRef::new(FEAT, FEATURE_UUID, CharProperties::READ),
        CharacteristicRef::new(
            RACP,
            RACP_UUID,
            CharProperties::WRITE | CharProperties::INDICATE,
        ),
        CharacteristicRef::new(REC, RECORD_UUID, CharProperties::NOTIFY),
        CharacteristicRef::new(OTHER, uuid_from_u16(0x2A29), CharProperties::READ),
    ]
}

pub fn session(settle_delay_ms: u32) -> SessionConfig {
    SessionConfig {
        settle_delay_ms,
        ..SessionConfig::default()
    }
}

/// A service that has already seen discovery of `profile`.
pub fn discovered(
    config: SessionConfig,
    profile: Vec<CharacteristicRef>,
) -> (BpsService, MockGatt, RecordingSink) {
    let mut service = BpsService::new(config);
    let mut gatt = MockGatt::new();
    let mut sink = RecordingSink::new();
    service.handle(GattEvent::Discovered(profile), &mut gatt, &mut sink);
    (service, gatt, sink)
}

pub fn cccd_done(characteristic: CharHandle, status: GattStatus) -> GattEvent {
    GattEvent::DescriptorWriteComplete {
        characteristic,
        status,
    }
}

pub fn feature_read(status: GattStatus, value: &[u8]) -> GattEvent {
    GattEvent::CharacteristicReadComplete {
        characteristic: FEAT,
        status,
        value: value.to_vec(),
    }
}

pub fn value(characteristic: CharHandle, bytes: &[u8]) -> GattEvent {
    GattEvent::ValueChanged {
        characteristic,
        value: bytes.to_vec(),
    }
}
