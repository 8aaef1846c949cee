//! Integration tests for the subscribe → CCCD writes → RACP command flow,
//! driven through `BpsService` with mock ports.

use std::time::Duration;

use bpmon::app::events::AppEvent;
use bpmon::codec::Feature;
use bpmon::error::{DecodeError, TransportError};
use bpmon::events::{GattEvent, GattStatus};
use bpmon::fsm::{AbortReason, SetupStep, SubscriptionState};
use bpmon::gatt::{CharacteristicRole, uuid16};

use crate::mock_gatt::{
    FEAT, GattCall, MEAS, MockGatt, RACP, REC, RecordingSink, cccd_done, discovered, feature_read,
    full_profile, session,
};

// ── Happy path ───────────────────────────────────────────────

#[test]
fn zero_delay_flow_issues_four_writes_in_order() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());

    app.subscribe(&mut gatt, &mut sink);
    assert_eq!(gatt.calls, vec![GattCall::Read(FEAT)]);

    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(MEAS, GattStatus::SUCCESS), &mut gatt, &mut sink);
    app.handle(cccd_done(RACP, GattStatus::SUCCESS), &mut gatt, &mut sink);
    app.handle(cccd_done(REC, GattStatus::SUCCESS), &mut gatt, &mut sink);

    assert_eq!(
        gatt.writes(),
        vec![
            GattCall::WriteDescriptor(MEAS, vec![0x02, 0x00]),
            GattCall::WriteDescriptor(RACP, vec![0x02, 0x00]),
            GattCall::WriteDescriptor(REC, vec![0x01, 0x00]),
            GattCall::WriteCharacteristic(RACP, vec![0x01, 0x01]),
        ]
    );
    assert!(
        !gatt
            .calls
            .iter()
            .any(|c| matches!(c, GattCall::SettleTimer { .. })),
        "zero delay must not start a timer"
    );
    assert_eq!(app.state(), SubscriptionState::Complete);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SetupComplete)), 1);
}

#[test]
fn feature_is_decoded_and_emitted() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);

    let features = sink.events.iter().find_map(|e| match e {
        AppEvent::FeatureDecoded(set) => Some(*set),
        _ => None,
    });
    let features = features.expect("FeatureDecoded emitted");
    assert!(features.contains(Feature::BodyMovementDetection));
    assert!(features.contains(Feature::IrregularPulseDetection));
    assert_eq!(features.features().len(), 2);
}

#[test]
fn settle_delay_gates_racp_subscription() {
    let (mut app, mut gatt, mut sink) = discovered(session(200), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x00, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(MEAS, GattStatus::SUCCESS), &mut gatt, &mut sink);

    assert_eq!(
        gatt.last_call(),
        Some(&GattCall::SettleTimer {
            delay: Duration::from_millis(200),
            epoch: 0
        })
    );
    assert_eq!(app.state(), SubscriptionState::MeasurementCccdEnabled);
    assert_eq!(gatt.writes().len(), 1);

    app.handle(GattEvent::SettleElapsed { epoch: 0 }, &mut gatt, &mut sink);
    assert_eq!(
        gatt.last_call(),
        Some(&GattCall::WriteDescriptor(RACP, vec![0x02, 0x00]))
    );
    assert_eq!(app.state(), SubscriptionState::RacpCccdPending);
}

#[test]
fn state_changes_are_reported_in_order() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(MEAS, GattStatus::SUCCESS), &mut gatt, &mut sink);

    use SubscriptionState as S;
    assert_eq!(
        sink.transitions(),
        vec![
            (S::Idle, S::FeatureReadPending),
            (S::FeatureReadPending, S::MeasurementCccdPending),
            (S::MeasurementCccdPending, S::RacpCccdPending),
        ]
    );
}

#[test]
fn measurement_only_peripheral() {
    let profile = full_profile()
        .into_iter()
        .filter(|c| c.handle != RACP && c.handle != REC)
        .collect();
    let (mut app, mut gatt, mut sink) = discovered(session(0), profile);
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(MEAS, GattStatus::SUCCESS), &mut gatt, &mut sink);

    assert_eq!(gatt.writes().len(), 1);
    assert_eq!(app.state(), SubscriptionState::MeasurementCccdEnabled);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SetupComplete)), 0);
}

#[test]
fn subscribe_twice_does_not_duplicate_writes() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.subscribe(&mut gatt, &mut sink);
    assert_eq!(gatt.calls, vec![GattCall::Read(FEAT)]);
}

// ── Failures ─────────────────────────────────────────────────

#[test]
fn racp_cccd_failure_aborts_without_record_write() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(MEAS, GattStatus::SUCCESS), &mut gatt, &mut sink);
    app.handle(cccd_done(RACP, GattStatus(0x0E)), &mut gatt, &mut sink);

    let reason = AbortReason::TransportFailure {
        step: SetupStep::RacpCccd,
        status: GattStatus(0x0E),
    };
    assert_eq!(app.state(), SubscriptionState::Aborted(reason));
    assert!(
        !gatt.writes().iter().any(|c| matches!(c, GattCall::WriteDescriptor(h, _) if *h == REC)),
        "no Record CCCD write after abort"
    );
    assert_eq!(
        sink.count(|e| *e == AppEvent::SetupAborted(reason)),
        1
    );

    // A stray success afterwards changes nothing.
    let before = gatt.calls.len();
    app.handle(cccd_done(RACP, GattStatus::SUCCESS), &mut gatt, &mut sink);
    assert_eq!(gatt.calls.len(), before);
}

#[test]
fn measurement_cccd_failure_aborts() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(MEAS, GattStatus(0x03)), &mut gatt, &mut sink);
    assert!(matches!(
        app.state(),
        SubscriptionState::Aborted(AbortReason::TransportFailure {
            step: SetupStep::MeasurementCccd,
            ..
        })
    ));
    assert_eq!(gatt.writes().len(), 1);
}

#[test]
fn failure_on_non_pending_handle_is_ignored() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(REC, GattStatus(0x0E)), &mut gatt, &mut sink);
    assert_eq!(app.state(), SubscriptionState::MeasurementCccdPending);
}

#[test]
fn feature_read_failure_still_subscribes_measurement() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus(0x05), &[]), &mut gatt, &mut sink);
    assert_eq!(
        gatt.last_call(),
        Some(&GattCall::WriteDescriptor(MEAS, vec![0x02, 0x00]))
    );
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FeatureDecoded(_))), 0);
}

#[test]
fn short_feature_value_reports_decode_failure_and_continues() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05]), &mut gatt, &mut sink);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::DecodeFailed {
                role: CharacteristicRole::Feature,
                error: DecodeError::TooShort { needed: 2, available: 1 },
                ..
            }
        )),
        1
    );
    assert_eq!(app.state(), SubscriptionState::MeasurementCccdPending);
}

#[test]
fn subscribe_without_measurement_aborts() {
    let profile = full_profile()
        .into_iter()
        .filter(|c| c.handle != MEAS)
        .collect();
    let (mut app, mut gatt, mut sink) = discovered(session(0), profile);
    app.subscribe(&mut gatt, &mut sink);
    assert_eq!(
        app.state(),
        SubscriptionState::Aborted(AbortReason::MeasurementMissing)
    );
    assert!(gatt.calls.is_empty());
    assert_eq!(
        sink.count(|e| *e == AppEvent::SetupAborted(AbortReason::MeasurementMissing)),
        1
    );
}

#[test]
fn refused_write_aborts_with_initiation_failure() {
    let mut app = bpmon::app::service::BpsService::new(session(0));
    let mut gatt = MockGatt::refusing(RACP, TransportError::Busy);
    let mut sink = RecordingSink::new();
    app.handle(GattEvent::Discovered(full_profile()), &mut gatt, &mut sink);
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(MEAS, GattStatus::SUCCESS), &mut gatt, &mut sink);

    assert_eq!(
        app.state(),
        SubscriptionState::Aborted(AbortReason::InitiationFailed {
            step: SetupStep::RacpCccd,
            error: TransportError::Busy,
        })
    );
    assert_eq!(gatt.writes().len(), 1);
}

#[test]
fn racp_command_rejection_is_surfaced() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(MEAS, GattStatus::SUCCESS), &mut gatt, &mut sink);
    app.handle(cccd_done(RACP, GattStatus::SUCCESS), &mut gatt, &mut sink);
    app.handle(cccd_done(REC, GattStatus::SUCCESS), &mut gatt, &mut sink);
    app.handle(
        GattEvent::CharacteristicWriteComplete {
            characteristic: RACP,
            status: GattStatus(0x80),
        },
        &mut gatt,
        &mut sink,
    );
    assert_eq!(
        sink.count(|e| *e == AppEvent::RacpCommandFailed(GattStatus(0x80))),
        1
    );
    assert_eq!(app.state(), SubscriptionState::Complete);
}

// ── Disconnect ───────────────────────────────────────────────

#[test]
fn disconnect_resets_and_invalidates_settle_timer() {
    let (mut app, mut gatt, mut sink) = discovered(session(200), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(MEAS, GattStatus::SUCCESS), &mut gatt, &mut sink);

    app.handle(GattEvent::Disconnected, &mut gatt, &mut sink);
    assert_eq!(app.state(), SubscriptionState::Idle);
    assert!(app.characteristics().measurement.is_none());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Disconnected)), 1);

    let writes = gatt.writes().len();
    app.handle(GattEvent::SettleElapsed { epoch: 0 }, &mut gatt, &mut sink);
    assert_eq!(gatt.writes().len(), writes, "stale timer must not write");

    // Reconnect: the new settle timer carries the new epoch.
    app.handle(GattEvent::Discovered(full_profile()), &mut gatt, &mut sink);
    app.subscribe(&mut gatt, &mut sink);
    app.handle(feature_read(GattStatus::SUCCESS, &[0x05, 0x00]), &mut gatt, &mut sink);
    app.handle(cccd_done(MEAS, GattStatus::SUCCESS), &mut gatt, &mut sink);
    assert_eq!(
        gatt.last_call(),
        Some(&GattCall::SettleTimer {
            delay: Duration::from_millis(200),
            epoch: 1
        })
    );
}

#[test]
fn rediscovery_mid_flow_is_ignored() {
    let (mut app, mut gatt, mut sink) = discovered(session(0), full_profile());
    app.subscribe(&mut gatt, &mut sink);
    sink.clear();
    app.handle(GattEvent::Discovered(Vec::new()), &mut gatt, &mut sink);
    assert!(app.characteristics().measurement.is_some());
    assert!(sink.events.is_empty());
}

#[test]
fn discovery_reports_resolved_roles() {
    let (app, _gatt, sink) = discovered(session(0), full_profile());
    assert!(app.characteristics().record_flow_available());
    assert!(matches!(
        sink.events.first(),
        Some(AppEvent::CharacteristicsResolved(r)) if r.feature.is_some()
    ));
    assert_eq!(uuid16::BLOOD_PRESSURE_SERVICE, 0x1810);
}
