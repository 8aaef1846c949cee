//! Application service, the hexagonal core.
//!
//! [`BpsService`] owns the subscription orchestrator for one connected
//! peripheral. It performs the effects the orchestrator returns through
//! the transport port, routes received values to the decoders and reports
//! everything through the event sink.
//!
//! ```text
//!  GattEvent ───▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        BpsService         │
//! GattTransport ◀─│  Orchestrator · Decoders  │
//!  SettleTimer  ◀─│                           │
//!                 └──────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::codec::{
    HexDump, decode_feature, decode_measurement, decode_racp_response, split_record_frame,
};
use crate::config::SessionConfig;
use crate::error::DecodeError;
use crate::events::GattEvent;
use crate::fsm::{Effect, Orchestrator, SubscriptionState};
use crate::gatt::{CharHandle, CharacteristicRole, ResolvedCharacteristics, uuid16};

use super::events::AppEvent;
use super::ports::{EventSink, GattTransport, SettleTimer};

// ───────────────────────────────────────────────────────────────
// BpsService
// ───────────────────────────────────────────────────────────────

/// Blood Pressure client session for one peripheral.
pub struct BpsService {
    fsm: Orchestrator,
    config: SessionConfig,
}

impl BpsService {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            fsm: Orchestrator::new(&config),
            config,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.fsm.state()
    }

    pub fn characteristics(&self) -> &ResolvedCharacteristics {
        &self.fsm.context().characteristics
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── Commands ──────────────────────────────────────────────

    /// Start the subscription flow. A no-op unless the session is idle.
    ///
    /// `io` satisfies **both** [`GattTransport`] and [`SettleTimer`]; the
    /// adapter owning the link usually owns the timer too.
    pub fn subscribe(
        &mut self,
        io: &mut (impl GattTransport + SettleTimer),
        sink: &mut impl EventSink,
    ) {
        let from = self.fsm.state();
        let effects = self.fsm.subscribe();
        self.perform(&effects, io);
        self.report_transition(from, sink);
    }

    // ── Event dispatch ────────────────────────────────────────

    /// Single entry point for everything the transport reports.
    pub fn handle(
        &mut self,
        event: GattEvent,
        io: &mut (impl GattTransport + SettleTimer),
        sink: &mut impl EventSink,
    ) {
        match &event {
            GattEvent::Discovered(list) => {
                let resolved = ResolvedCharacteristics::resolve(list);
                if self.fsm.attach(resolved) {
                    sink.emit(&AppEvent::CharacteristicsResolved(resolved));
                }
                return;
            }
            GattEvent::ValueChanged {
                characteristic,
                value,
            } => {
                self.route_value(*characteristic, value, sink);
                return;
            }
            GattEvent::Disconnected => {
                let from = self.fsm.state();
                info!("disconnected in {from}");
                self.fsm.reset();
                self.report_transition(from, sink);
                sink.emit(&AppEvent::Disconnected);
                return;
            }
            GattEvent::CharacteristicReadComplete {
                characteristic,
                status,
                value,
            } if status.is_success()
                && self.role_of(*characteristic) == Some(CharacteristicRole::Feature) =>
            {
                self.emit_feature(value, sink);
            }
            GattEvent::CharacteristicWriteComplete {
                characteristic,
                status,
            } if !status.is_success()
                && self.fsm.state() == SubscriptionState::Complete
                && self.role_of(*characteristic) == Some(CharacteristicRole::Racp) =>
            {
                sink.emit(&AppEvent::RacpCommandFailed(*status));
            }
            _ => {}
        }

        let from = self.fsm.state();
        let effects = self.fsm.handle(&event);
        self.perform(&effects, io);
        self.report_transition(from, sink);
    }

    // ── Internal ──────────────────────────────────────────────

    fn role_of(&self, handle: CharHandle) -> Option<CharacteristicRole> {
        self.fsm.context().characteristics.role_of(handle)
    }

    /// Issue effects in order. A synchronous refusal aborts the flow and
    /// drops whatever follows it.
    fn perform(&mut self, effects: &[Effect], io: &mut (impl GattTransport + SettleTimer)) {
        for effect in effects {
            let started = match *effect {
                Effect::ReadCharacteristic { characteristic } => {
                    io.read_characteristic(characteristic)
                }
                Effect::WriteDescriptor {
                    characteristic,
                    value,
                } => io.write_descriptor(characteristic, &value),
                Effect::WriteCharacteristic {
                    characteristic,
                    value,
                } => io.write_characteristic(characteristic, &value),
                Effect::StartSettleTimer { delay, epoch } => {
                    debug!("settle timer {}ms (epoch {epoch})", delay.as_millis());
                    io.start_settle_timer(delay, epoch);
                    Ok(())
                }
            };
            if let Err(error) = started {
                warn!("{effect:?} could not be started: {error}");
                self.fsm.initiation_failed(error);
                return;
            }
        }
    }

    fn report_transition(&self, from: SubscriptionState, sink: &mut impl EventSink) {
        let to = self.fsm.state();
        if to == from {
            return;
        }
        sink.emit(&AppEvent::StateChanged { from, to });
        match to {
            SubscriptionState::Complete => sink.emit(&AppEvent::SetupComplete),
            SubscriptionState::Aborted(reason) => sink.emit(&AppEvent::SetupAborted(reason)),
            _ => {}
        }
    }

    fn route_value(&self, handle: CharHandle, value: &[u8], sink: &mut impl EventSink) {
        let Some(role) = self.role_of(handle) else {
            debug!("value on unresolved characteristic {handle}: {}", HexDump(value));
            return;
        };
        debug!("{role} <- {}", HexDump(value));

        match role {
            CharacteristicRole::Measurement => match decode_measurement(value) {
                Ok(m) => sink.emit(&AppEvent::Measurement(m)),
                Err(e) => emit_decode_failed(role, e, value, sink),
            },
            CharacteristicRole::Record => self.emit_record(value, sink),
            CharacteristicRole::Racp => match decode_racp_response(value) {
                Ok(r) => sink.emit(&AppEvent::RacpResponse(r)),
                Err(e) => emit_decode_failed(role, e, value, sink),
            },
            CharacteristicRole::Feature => self.emit_feature(value, sink),
        }
    }

    fn emit_feature(&self, value: &[u8], sink: &mut impl EventSink) {
        match decode_feature(value) {
            Ok(set) => sink.emit(&AppEvent::FeatureDecoded(set)),
            Err(e) => emit_decode_failed(CharacteristicRole::Feature, e, value, sink),
        }
    }

    fn emit_record(&self, value: &[u8], sink: &mut impl EventSink) {
        let (header, payload) = match split_record_frame(value) {
            Ok(frame) => frame,
            Err(e) => return emit_decode_failed(CharacteristicRole::Record, e, value, sink),
        };
        sink.emit(&AppEvent::RecordFrame {
            header,
            payload: payload.to_vec(),
        });

        if !(self.config.decode_embedded_measurements
            && header.is_single_segment()
            && header.embedded_type_uuid16 == uuid16::BLOOD_PRESSURE_MEASUREMENT)
        {
            return;
        }
        match decode_measurement(payload) {
            Ok(measurement) => sink.emit(&AppEvent::RecordMeasurement {
                sequence_number: header.sequence_number,
                measurement,
            }),
            Err(e) => emit_decode_failed(CharacteristicRole::Record, e, payload, sink),
        }
    }
}

fn emit_decode_failed(
    role: CharacteristicRole,
    error: DecodeError,
    raw: &[u8],
    sink: &mut impl EventSink,
) {
    warn!("{role}: {error}");
    sink.emit(&AppEvent::DecodeFailed {
        role,
        error,
        raw: raw.to_vec(),
    });
}
