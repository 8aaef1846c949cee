//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade. Raw payloads are hex-dumped so unknown or failed
//! values can still be read off the console.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::codec::{HexDump, Measurement};

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink {
    measurements: u32,
    records: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live measurements logged so far.
    pub fn measurements(&self) -> u32 {
        self.measurements
    }

    /// Record frames logged so far.
    pub fn records(&self) -> u32 {
        self.records
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::CharacteristicsResolved(r) => {
                info!(
                    "GATT  | measurement={} feature={} racp={} record={}",
                    r.measurement.is_some(),
                    r.feature.is_some(),
                    r.racp.is_some(),
                    r.record.is_some(),
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {from} -> {to}");
            }
            AppEvent::SetupComplete => {
                info!("SETUP | complete, stored records requested");
            }
            AppEvent::SetupAborted(reason) => {
                warn!("SETUP | aborted: {reason}");
            }
            AppEvent::FeatureDecoded(set) => {
                info!("FEAT  | {set}");
            }
            AppEvent::Measurement(m) => {
                self.measurements += 1;
                info!("BP    | {}", render(m));
            }
            AppEvent::RecordFrame { header, payload } => {
                self.records += 1;
                info!(
                    "REC   | seq={} first={} last={} seg={} type=0x{:04X} len={} | {}",
                    header.sequence_number,
                    header.is_first_segment,
                    header.is_last_segment,
                    header.segment_counter,
                    header.embedded_type_uuid16,
                    header.payload_length,
                    HexDump(payload),
                );
            }
            AppEvent::RecordMeasurement {
                sequence_number,
                measurement,
            } => {
                info!("REC   | seq={sequence_number} | {}", render(measurement));
            }
            AppEvent::RacpResponse(r) => {
                info!("RACP  | {r}");
            }
            AppEvent::DecodeFailed { role, error, raw } => {
                warn!("DECODE| {role}: {error} | {}", HexDump(raw));
            }
            AppEvent::RacpCommandFailed(status) => {
                warn!("RACP  | command write FAILED: status {status}");
            }
            AppEvent::Disconnected => {
                info!("LINK  | disconnected");
            }
        }
    }
}

fn render(m: &Measurement) -> String {
    use core::fmt::Write as _;

    let unit = m.unit.symbol();
    let mut out = format!(
        "{:.1}/{:.1} {unit} MAP={:.1}",
        m.systolic, m.diastolic, m.mean_arterial_pressure
    );
    if let Some(ts) = m.timestamp {
        let _ = write!(out, " at {ts}");
    }
    if let Some(pulse) = m.pulse_rate {
        let _ = write!(out, " pulse={pulse:.0}bpm");
    }
    if let Some(user) = m.user_id {
        let _ = write!(out, " user={user}");
    }
    if let Some(status) = m.status {
        let _ = write!(out, " status=0x{status:04X}");
    }
    out
}
