//! Integration tests for value routing: notifications and indications go
//! to the matching decoder regardless of the subscription state.

use bpmon::app::events::AppEvent;
use bpmon::codec::{PressureUnit, RacpResponse, RacpResponseCode};
use bpmon::config::SessionConfig;
use bpmon::error::DecodeError;
use bpmon::gatt::CharacteristicRole;

use crate::mock_gatt::{MEAS, OTHER, RACP, REC, discovered, full_profile, session, value};

const BASIC_MEASUREMENT: [u8; 7] = [0x00, 0x78, 0x00, 0x50, 0x00, 0x5D, 0x00];

#[test]
fn measurement_routed_before_subscribe() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    sink.clear();
    app.handle(value(MEAS, &BASIC_MEASUREMENT), &mut gatt, &mut sink);

    let [AppEvent::Measurement(m)] = sink.events.as_slice() else {
        panic!("expected one Measurement, got {:?}", sink.events);
    };
    assert_eq!(m.systolic, 120.0);
    assert_eq!(m.diastolic, 80.0);
    assert_eq!(m.mean_arterial_pressure, 93.0);
    assert_eq!(m.unit, PressureUnit::MmHg);
    assert!(gatt.calls.is_empty());
}

#[test]
fn truncated_measurement_reports_decode_failure() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    let state = app.state();
    sink.clear();

    app.handle(value(MEAS, &BASIC_MEASUREMENT[..6]), &mut gatt, &mut sink);
    assert_eq!(
        sink.events,
        vec![AppEvent::DecodeFailed {
            role: CharacteristicRole::Measurement,
            error: DecodeError::TooShort {
                needed: 7,
                available: 6
            },
            raw: BASIC_MEASUREMENT[..6].to_vec(),
        }]
    );
    assert_eq!(app.state(), state, "decode errors never touch the flow");
}

#[test]
fn timestamp_flag_with_twelve_bytes_is_rejected() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    sink.clear();
    let mut bytes = vec![0x02, 0x78, 0x00, 0x50, 0x00, 0x5D, 0x00];
    bytes.extend_from_slice(&[0xE8, 0x07, 0x03, 0x0F, 0x08]);
    app.handle(value(MEAS, &bytes), &mut gatt, &mut sink);
    assert!(matches!(
        sink.events.as_slice(),
        [AppEvent::DecodeFailed {
            error: DecodeError::TooShort { .. },
            ..
        }]
    ));
}

#[test]
fn record_frame_header_is_surfaced() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    sink.clear();
    app.handle(
        value(REC, &[0x81, 0x34, 0x12, 0x35, 0x2A, 0xAA]),
        &mut gatt,
        &mut sink,
    );

    let [AppEvent::RecordFrame { header, payload }] = sink.events.as_slice() else {
        panic!("expected one RecordFrame, got {:?}", sink.events);
    };
    assert!(header.is_first_segment);
    assert!(!header.is_last_segment);
    assert_eq!(header.segment_counter, 1);
    assert_eq!(header.sequence_number, 0x1234);
    assert_eq!(header.embedded_type_uuid16, 0x2A35);
    assert_eq!(payload, &vec![0xAA]);
}

#[test]
fn embedded_measurement_not_decoded_by_default() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    sink.clear();
    let mut frame = vec![0xC0, 0x07, 0x00, 0x35, 0x2A];
    frame.extend_from_slice(&BASIC_MEASUREMENT);
    app.handle(value(REC, &frame), &mut gatt, &mut sink);
    assert_eq!(sink.events.len(), 1);
}

#[test]
fn embedded_measurement_decoded_when_enabled() {
    let config = SessionConfig {
        decode_embedded_measurements: true,
        ..session(0)
    };
    let (mut app, mut gatt, mut sink) = discovered(config, full_profile());
    sink.clear();
    let mut frame = vec![0xC0, 0x07, 0x00, 0x35, 0x2A];
    frame.extend_from_slice(&BASIC_MEASUREMENT);
    app.handle(value(REC, &frame), &mut gatt, &mut sink);

    assert_eq!(sink.events.len(), 2);
    let AppEvent::RecordMeasurement {
        sequence_number,
        measurement,
    } = &sink.events[1]
    else {
        panic!("expected RecordMeasurement, got {:?}", sink.events[1]);
    };
    assert_eq!(*sequence_number, 7);
    assert_eq!(measurement.systolic, 120.0);
}

#[test]
fn multi_segment_records_are_not_decoded() {
    let config = SessionConfig {
        decode_embedded_measurements: true,
        ..session(0)
    };
    let (mut app, mut gatt, mut sink) = discovered(config, full_profile());
    sink.clear();
    let mut frame = vec![0x80, 0x07, 0x00, 0x35, 0x2A];
    frame.extend_from_slice(&BASIC_MEASUREMENT);
    app.handle(value(REC, &frame), &mut gatt, &mut sink);
    assert_eq!(sink.events.len(), 1);
}

#[test]
fn short_record_reports_decode_failure() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    sink.clear();
    app.handle(value(REC, &[0x81, 0x00]), &mut gatt, &mut sink);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::DecodeFailed {
                role: CharacteristicRole::Record,
                ..
            }
        )),
        1
    );
}

#[test]
fn racp_indication_decoded() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    sink.clear();
    app.handle(value(RACP, &[0x06, 0x00, 0x01, 0x06]), &mut gatt, &mut sink);
    assert_eq!(
        sink.events,
        vec![AppEvent::RacpResponse(RacpResponse::ResponseCode {
            request_op_code: 0x01,
            response_code: RacpResponseCode::NoRecordsFound,
        })]
    );
}

#[test]
fn unsupported_racp_op_code_reported() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    sink.clear();
    app.handle(value(RACP, &[0x0A, 0x00]), &mut gatt, &mut sink);
    assert!(matches!(
        sink.events.as_slice(),
        [AppEvent::DecodeFailed {
            role: CharacteristicRole::Racp,
            error: DecodeError::UnsupportedOpCode(0x0A),
            ..
        }]
    ));
}

#[test]
fn unknown_handle_is_ignored() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    sink.clear();
    app.handle(value(OTHER, &[0x01, 0x02]), &mut gatt, &mut sink);
    assert!(sink.events.is_empty());
}

#[test]
fn values_before_discovery_are_ignored() {
    let mut app = bpmon::app::service::BpsService::new(session(0));
    let mut gatt = crate::mock_gatt::MockGatt::new();
    let mut sink = crate::mock_gatt::RecordingSink::new();
    app.handle(value(MEAS, &BASIC_MEASUREMENT), &mut gatt, &mut sink);
    assert!(sink.events.is_empty());
}
