//! Concrete state handlers and the state table.
//!
//! Each state is one plain `fn` pointer: no closures, no dynamic dispatch.
//!
//! ```text
//!  IDLE ──[subscribe, feature readable]──▶ FEATURE_READ_PENDING
//!    │                                          │ [read done, any status]
//!    └──[subscribe]──────────────┐              ▼
//!                                └──▶ MEASUREMENT_CCCD_PENDING
//!                                          │ [ok]
//!                                          ▼
//!                                MEASUREMENT_CCCD_ENABLED
//!                                          │ [settle elapsed]
//!                                          ▼
//!                                  RACP_CCCD_PENDING
//!                                          │ [ok]
//!                                          ▼
//!                                  RECORD_CCCD_PENDING
//!                                          │ [ok] / write 01 01
//!                                          ▼
//!                                       COMPLETE
//!
//!  Any *_PENDING ──[failure status]──▶ ABORTED
//! ```
//!
//! `RacpCccdEnabled`, `RecordCccdEnabled` and `RacpCommandSent` are passed
//! through within a single transition; the flow never rests there.

use log::{info, warn};

use super::context::SessionContext;
use super::{AbortReason, Effect, Input, SetupStep, SubscriptionState, Transition};
use crate::codec::RacpCommand;
use crate::events::{GattEvent, GattStatus};
use crate::gatt::{CCCD_ENABLE_INDICATION, CCCD_ENABLE_NOTIFICATION, CharacteristicRole};

/// Per-state handler. `None` leaves the state unchanged.
pub type InputFn = fn(&SessionContext, Input<'_>) -> Option<Transition>;

/// One row of the state table.
pub struct StateDescriptor {
    pub name: &'static str,
    pub on_input: InputFn,
}

// ═══════════════════════════════════════════════════════════════════════════
//  Table
// ═══════════════════════════════════════════════════════════════════════════

/// Indexed by [`SubscriptionState::index`].
pub static STATE_TABLE: [StateDescriptor; SubscriptionState::COUNT] = [
    StateDescriptor {
        name: "Idle",
        on_input: idle,
    },
    StateDescriptor {
        name: "FeatureReadPending",
        on_input: feature_read_pending,
    },
    StateDescriptor {
        name: "MeasurementCccdPending",
        on_input: measurement_cccd_pending,
    },
    StateDescriptor {
        name: "MeasurementCccdEnabled",
        on_input: measurement_cccd_enabled,
    },
    StateDescriptor {
        name: "RacpCccdPending",
        on_input: racp_cccd_pending,
    },
    StateDescriptor {
        name: "RacpCccdEnabled",
        on_input: pass_through,
    },
    StateDescriptor {
        name: "RecordCccdPending",
        on_input: record_cccd_pending,
    },
    StateDescriptor {
        name: "RecordCccdEnabled",
        on_input: pass_through,
    },
    StateDescriptor {
        name: "RacpCommandSent",
        on_input: pass_through,
    },
    StateDescriptor {
        name: "Complete",
        on_input: complete,
    },
    StateDescriptor {
        name: "Aborted",
        on_input: aborted,
    },
];

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle(ctx: &SessionContext, input: Input<'_>) -> Option<Transition> {
    let Input::Subscribe = input else {
        return None;
    };
    if ctx.characteristics.measurement.is_none() {
        warn!("Blood Pressure Measurement not resolved, cannot subscribe");
        return Some(Transition::abort(AbortReason::MeasurementMissing));
    }
    match ctx.characteristics.feature {
        Some(feature) if ctx.read_feature && feature.properties.readable() => {
            info!("reading Blood Pressure Feature");
            Some(Transition::with(
                SubscriptionState::FeatureReadPending,
                Effect::ReadCharacteristic {
                    characteristic: feature.handle,
                },
            ))
        }
        _ => Some(enable_measurement(ctx)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  FEATURE_READ_PENDING: the read result never blocks the flow
// ═══════════════════════════════════════════════════════════════════════════

fn feature_read_pending(ctx: &SessionContext, input: Input<'_>) -> Option<Transition> {
    let Input::Gatt(GattEvent::CharacteristicReadComplete {
        characteristic,
        status,
        ..
    }) = input
    else {
        return None;
    };
    if ctx.handle(CharacteristicRole::Feature) != Some(*characteristic) {
        return None;
    }
    if !status.is_success() {
        warn!("Feature read FAILED: status {status}, subscribing anyway");
    }
    Some(enable_measurement(ctx))
}

fn enable_measurement(ctx: &SessionContext) -> Transition {
    let Some(measurement) = ctx.handle(CharacteristicRole::Measurement) else {
        return Transition::abort(AbortReason::MeasurementMissing);
    };
    info!("enabling Measurement indications");
    Transition::with(
        SubscriptionState::MeasurementCccdPending,
        Effect::WriteDescriptor {
            characteristic: measurement,
            value: CCCD_ENABLE_INDICATION,
        },
    )
}

// ═══════════════════════════════════════════════════════════════════════════
//  MEASUREMENT_CCCD_PENDING / ENABLED
// ═══════════════════════════════════════════════════════════════════════════

fn measurement_cccd_pending(ctx: &SessionContext, input: Input<'_>) -> Option<Transition> {
    let status = cccd_completion(ctx, input, CharacteristicRole::Measurement)?;
    if let Some(abort) = failed(SetupStep::MeasurementCccd, status) {
        return Some(abort);
    }
    info!("Measurement CCCD enabled");

    if !ctx.record_flow_enabled() {
        info!("record flow unavailable, receiving live measurements only");
        return Some(Transition::to(SubscriptionState::MeasurementCccdEnabled));
    }
    if ctx.settle_delay.is_zero() {
        return Some(enable_racp(ctx));
    }
    Some(Transition::with(
        SubscriptionState::MeasurementCccdEnabled,
        Effect::StartSettleTimer {
            delay: ctx.settle_delay,
            epoch: ctx.epoch,
        },
    ))
}

fn measurement_cccd_enabled(ctx: &SessionContext, input: Input<'_>) -> Option<Transition> {
    match input {
        Input::Gatt(GattEvent::SettleElapsed { epoch })
            if *epoch == ctx.epoch && ctx.record_flow_enabled() =>
        {
            Some(enable_racp(ctx))
        }
        _ => None,
    }
}

fn enable_racp(ctx: &SessionContext) -> Transition {
    let Some(racp) = ctx.handle(CharacteristicRole::Racp) else {
        return Transition::to(SubscriptionState::MeasurementCccdEnabled);
    };
    info!("enabling RACP indications");
    Transition::with(
        SubscriptionState::RacpCccdPending,
        Effect::WriteDescriptor {
            characteristic: racp,
            value: CCCD_ENABLE_INDICATION,
        },
    )
}

// ═══════════════════════════════════════════════════════════════════════════
//  RACP_CCCD_PENDING → (RACP_CCCD_ENABLED) → RECORD_CCCD_PENDING
// ═══════════════════════════════════════════════════════════════════════════

fn racp_cccd_pending(ctx: &SessionContext, input: Input<'_>) -> Option<Transition> {
    let status = cccd_completion(ctx, input, CharacteristicRole::Racp)?;
    if let Some(abort) = failed(SetupStep::RacpCccd, status) {
        return Some(abort);
    }
    info!("RACP CCCD enabled");

    let Some(record) = ctx.handle(CharacteristicRole::Record) else {
        return Some(Transition::to(SubscriptionState::RacpCccdEnabled));
    };
    info!("enabling Record notifications");
    Some(Transition::with(
        SubscriptionState::RecordCccdPending,
        Effect::WriteDescriptor {
            characteristic: record,
            value: CCCD_ENABLE_NOTIFICATION,
        },
    ))
}

// ═══════════════════════════════════════════════════════════════════════════
//  RECORD_CCCD_PENDING → (RECORD_CCCD_ENABLED → RACP_COMMAND_SENT) → COMPLETE
// ═══════════════════════════════════════════════════════════════════════════

fn record_cccd_pending(ctx: &SessionContext, input: Input<'_>) -> Option<Transition> {
    let status = cccd_completion(ctx, input, CharacteristicRole::Record)?;
    if let Some(abort) = failed(SetupStep::RecordCccd, status) {
        return Some(abort);
    }
    info!("Record CCCD enabled");

    let Some(racp) = ctx.handle(CharacteristicRole::Racp) else {
        return Some(Transition::to(SubscriptionState::RecordCccdEnabled));
    };
    info!("requesting all stored records");
    Some(Transition::with(
        SubscriptionState::Complete,
        Effect::WriteCharacteristic {
            characteristic: racp,
            value: RacpCommand::REPORT_ALL.encode(),
        },
    ))
}

// ═══════════════════════════════════════════════════════════════════════════
//  Terminal and transient states
// ═══════════════════════════════════════════════════════════════════════════

fn complete(ctx: &SessionContext, input: Input<'_>) -> Option<Transition> {
    match input {
        Input::Gatt(GattEvent::CharacteristicWriteComplete {
            characteristic,
            status,
        }) if ctx.handle(CharacteristicRole::Racp) == Some(*characteristic) => {
            if status.is_success() {
                info!("RACP command accepted");
            } else {
                warn!("RACP command write FAILED: status {status}");
            }
            Some(Transition::to(SubscriptionState::Complete))
        }
        _ => None,
    }
}

fn pass_through(_ctx: &SessionContext, _input: Input<'_>) -> Option<Transition> {
    None
}

fn aborted(_ctx: &SessionContext, _input: Input<'_>) -> Option<Transition> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Status of a CCCD write completion on the characteristic in `role`.
fn cccd_completion(
    ctx: &SessionContext,
    input: Input<'_>,
    role: CharacteristicRole,
) -> Option<GattStatus> {
    match input {
        Input::Gatt(GattEvent::DescriptorWriteComplete {
            characteristic,
            status,
        }) if ctx.handle(role) == Some(*characteristic) => Some(*status),
        _ => None,
    }
}

fn failed(step: SetupStep, status: GattStatus) -> Option<Transition> {
    if status.is_success() {
        return None;
    }
    warn!("{step} FAILED: status {status}");
    Some(Transition::abort(AbortReason::TransportFailure { step, status }))
}
