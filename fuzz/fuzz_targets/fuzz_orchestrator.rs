//! Fuzz target: subscription orchestrator
//!
//! Every byte pair becomes one GATT event fed to a subscribed
//! orchestrator. No event may yield more than one transport operation,
//! and an aborted session must stay aborted and silent.
//!
//! cargo fuzz run fuzz_orchestrator

#![no_main]

use bpmon::config::SessionConfig;
use bpmon::events::{GattEvent, GattStatus};
use bpmon::fsm::{Orchestrator, SubscriptionState};
use bpmon::gatt::{
    CharHandle, CharProperties, CharacteristicRef, FEATURE_UUID, MEASUREMENT_UUID, RACP_UUID,
    RECORD_UUID, ResolvedCharacteristics,
};
use libfuzzer_sys::fuzz_target;

fn event(kind: u8, arg: u8) -> GattEvent {
    let characteristic = CharHandle(u16::from(arg & 0x07));
    let status = if arg & 0x80 == 0 {
        GattStatus::SUCCESS
    } else {
        GattStatus(arg)
    };
    match kind % 5 {
        0 => GattEvent::DescriptorWriteComplete {
            characteristic,
            status,
        },
        1 => GattEvent::CharacteristicWriteComplete {
            characteristic,
            status,
        },
        2 => GattEvent::CharacteristicReadComplete {
            characteristic,
            status,
            value: vec![arg, 0],
        },
        3 => GattEvent::SettleElapsed {
            epoch: u32::from(arg & 0x01),
        },
        _ => GattEvent::ValueChanged {
            characteristic,
            value: vec![arg],
        },
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&settle, rest)) = data.split_first() else {
        return;
    };
    let config = SessionConfig {
        settle_delay_ms: u32::from(settle % 2) * 200,
        ..SessionConfig::default()
    };
    let mut fsm = Orchestrator::new(&config);
    let profile = [
        CharacteristicRef::new(CharHandle(1), MEASUREMENT_UUID, CharProperties::INDICATE),
        CharacteristicRef::new(CharHandle(2), FEATURE_UUID, CharProperties::READ),
        CharacteristicRef::new(
            CharHandle(3),
            RACP_UUID,
            CharProperties::WRITE | CharProperties::INDICATE,
        ),
        CharacteristicRef::new(CharHandle(4), RECORD_UUID, CharProperties::NOTIFY),
    ];
    assert!(fsm.attach(ResolvedCharacteristics::resolve(&profile)));
    let _ = fsm.subscribe();

    for pair in rest.chunks_exact(2) {
        let was_aborted = matches!(fsm.state(), SubscriptionState::Aborted(_));
        let effects = fsm.handle(&event(pair[0], pair[1]));
        assert!(effects.iter().filter(|e| e.is_transport_op()).count() <= 1);
        if was_aborted {
            assert!(effects.is_empty());
            assert!(matches!(fsm.state(), SubscriptionState::Aborted(_)));
        }
    }
});
