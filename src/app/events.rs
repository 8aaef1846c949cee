//! Outbound application events.
//!
//! The [`BpsService`](super::service::BpsService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them: log them, render them, forward them.

use crate::codec::{FeatureSet, Measurement, RacpResponse, RecordFrameHeader};
use crate::error::DecodeError;
use crate::events::GattStatus;
use crate::fsm::{AbortReason, SubscriptionState};
use crate::gatt::{CharacteristicRole, ResolvedCharacteristics};

/// Structured events emitted by the client core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Discovery results were resolved into roles.
    CharacteristicsResolved(ResolvedCharacteristics),

    /// The orchestrator moved between states.
    StateChanged {
        from: SubscriptionState,
        to: SubscriptionState,
    },

    /// All subscriptions are in place and the stored-record request went
    /// out.
    SetupComplete,

    /// The setup flow stopped; no further writes will be issued.
    SetupAborted(AbortReason),

    // ── Decoded values ────────────────────────────────────
    FeatureDecoded(FeatureSet),
    Measurement(Measurement),
    /// A Record frame. `payload` is the raw bytes after the header.
    RecordFrame {
        header: RecordFrameHeader,
        payload: Vec<u8>,
    },
    /// A single-segment record whose payload decoded as a measurement.
    RecordMeasurement {
        sequence_number: u16,
        measurement: Measurement,
    },
    RacpResponse(RacpResponse),

    /// A value on `role` could not be decoded. `raw` is kept for logs.
    DecodeFailed {
        role: CharacteristicRole,
        error: DecodeError,
        raw: Vec<u8>,
    },

    /// The stored-record request was rejected by the peripheral.
    RacpCommandFailed(GattStatus),

    /// The link went down; the session was reset.
    Disconnected,
}
