//! Function-pointer state machine for the subscription flow.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  STATE_TABLE                                                 │
//! │  ┌────────────────────────┬──────────────────────────────┐   │
//! │  │ SubscriptionState      │ on_input                     │   │
//! │  ├────────────────────────┼──────────────────────────────┤   │
//! │  │ Idle                   │ fn(&ctx, input)->Option<Tr>  │   │
//! │  │ FeatureReadPending     │ fn(&ctx, input)->Option<Tr>  │   │
//! │  │ MeasurementCccdPending │ fn(&ctx, input)->Option<Tr>  │   │
//! │  │ ...                    │ ...                          │   │
//! │  │ Aborted                │ fn(&ctx, input)->Option<Tr>  │   │
//! │  └────────────────────────┴──────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers are pure: given the current context and one [`Input`] they
//! return the next state and the transport operations to issue, as data.
//! The [`Orchestrator`] owns the current state, applies transitions and
//! hands the [`Effects`] back to its caller, which performs them.

pub mod context;
pub mod states;

use core::fmt;
use std::time::Duration;

use context::SessionContext;
use log::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::TransportError;
use crate::events::{GattEvent, GattStatus};
use crate::gatt::{CharHandle, ResolvedCharacteristics};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Position in the subscription flow.
/// Must stay in sync with [`states::STATE_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Idle,
    FeatureReadPending,
    MeasurementCccdPending,
    MeasurementCccdEnabled,
    RacpCccdPending,
    RacpCccdEnabled,
    RecordCccdPending,
    RecordCccdEnabled,
    RacpCommandSent,
    Complete,
    Aborted(AbortReason),
}

impl SubscriptionState {
    /// Total number of states, used to size the table.
    pub const COUNT: usize = 11;

    pub const fn index(self) -> usize {
        match self {
            Self::Idle => 0,
            Self::FeatureReadPending => 1,
            Self::MeasurementCccdPending => 2,
            Self::MeasurementCccdEnabled => 3,
            Self::RacpCccdPending => 4,
            Self::RacpCccdEnabled => 5,
            Self::RecordCccdPending => 6,
            Self::RecordCccdEnabled => 7,
            Self::RacpCommandSent => 8,
            Self::Complete => 9,
            Self::Aborted(_) => 10,
        }
    }

    pub fn name(self) -> &'static str {
        states::STATE_TABLE[self.index()].name
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Aborted(_))
    }

    /// The setup step whose operation is outstanding in this state.
    /// `Complete` owns the RACP command write, which is not awaited.
    pub const fn pending_step(self) -> Option<SetupStep> {
        match self {
            Self::FeatureReadPending => Some(SetupStep::FeatureRead),
            Self::MeasurementCccdPending => Some(SetupStep::MeasurementCccd),
            Self::RacpCccdPending => Some(SetupStep::RacpCccd),
            Self::RecordCccdPending => Some(SetupStep::RecordCccd),
            Self::Complete => Some(SetupStep::RacpCommand),
            _ => None,
        }
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted(reason) => write!(f, "Aborted ({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

// ---------------------------------------------------------------------------
// Abort reasons
// ---------------------------------------------------------------------------

/// Operations the setup flow issues, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    FeatureRead,
    MeasurementCccd,
    RacpCccd,
    RecordCccd,
    RacpCommand,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FeatureRead => "Feature read",
            Self::MeasurementCccd => "Measurement CCCD write",
            Self::RacpCccd => "RACP CCCD write",
            Self::RecordCccd => "Record CCCD write",
            Self::RacpCommand => "RACP command write",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The pending step completed with a non-success status.
    TransportFailure { step: SetupStep, status: GattStatus },
    /// The transport refused to start the step's operation.
    InitiationFailed {
        step: SetupStep,
        error: TransportError,
    },
    /// `subscribe()` was called without a resolved Measurement
    /// characteristic.
    MeasurementMissing,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportFailure { step, status } => write!(f, "{step} FAILED: status {status}"),
            Self::InitiationFailed { step, error } => {
                write!(f, "{step} could not be started: {error}")
            }
            Self::MeasurementMissing => write!(f, "Measurement characteristic not found"),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs, effects, transitions
// ---------------------------------------------------------------------------

/// What a handler reacts to: the caller's subscribe request or a
/// transport event.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Subscribe,
    Gatt(&'a GattEvent),
}

/// One operation for the caller to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ReadCharacteristic {
        characteristic: CharHandle,
    },
    /// Write `value` to the CCCD of `characteristic`.
    WriteDescriptor {
        characteristic: CharHandle,
        value: [u8; 2],
    },
    WriteCharacteristic {
        characteristic: CharHandle,
        value: [u8; 2],
    },
    /// Answer with `GattEvent::SettleElapsed { epoch }` after `delay`.
    StartSettleTimer { delay: Duration, epoch: u32 },
}

impl Effect {
    pub const fn is_transport_op(&self) -> bool {
        !matches!(self, Self::StartSettleTimer { .. })
    }
}

/// Effects produced by a single transition.
pub type Effects = heapless::Vec<Effect, 2>;

/// Result of a handler: where to go and what to issue on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: SubscriptionState,
    pub effects: Effects,
}

impl Transition {
    pub fn to(next: SubscriptionState) -> Self {
        Self {
            next,
            effects: Effects::new(),
        }
    }

    pub fn with(next: SubscriptionState, effect: Effect) -> Self {
        let mut t = Self::to(next);
        // An empty Vec always has room for one.
        let _ = t.effects.push(effect);
        t
    }

    pub fn abort(reason: AbortReason) -> Self {
        Self::to(SubscriptionState::Aborted(reason))
    }
}

/// Pure transition function: look up the handler for `state` and apply
/// `input`. `None` means the input is not meaningful in this state.
pub fn transition(
    state: SubscriptionState,
    ctx: &SessionContext,
    input: Input<'_>,
) -> Option<Transition> {
    (states::STATE_TABLE[state.index()].on_input)(ctx, input)
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// One orchestrator per connected peripheral.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    state: SubscriptionState,
    ctx: SessionContext,
}

impl Orchestrator {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            state: SubscriptionState::Idle,
            ctx: SessionContext::new(config),
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    /// Store the characteristics resolved after discovery. Only accepted
    /// while `Idle`; returns whether they were taken.
    pub fn attach(&mut self, characteristics: ResolvedCharacteristics) -> bool {
        if self.state != SubscriptionState::Idle {
            warn!("characteristics ignored: flow already in {}", self.state);
            return false;
        }
        self.ctx.characteristics = characteristics;
        true
    }

    /// Start the flow. A no-op outside `Idle`.
    pub fn subscribe(&mut self) -> Effects {
        self.apply(Input::Subscribe)
    }

    pub fn handle(&mut self, event: &GattEvent) -> Effects {
        self.apply(Input::Gatt(event))
    }

    /// The transport refused the operation the current state is waiting
    /// on.
    pub fn initiation_failed(&mut self, error: TransportError) {
        let Some(step) = self.state.pending_step() else {
            warn!("transport error {error} with nothing pending in {}", self.state);
            return;
        };
        self.enter(SubscriptionState::Aborted(AbortReason::InitiationFailed {
            step,
            error,
        }));
    }

    /// Link lost: back to `Idle`, references dropped, pending settle
    /// timers invalidated. In-flight operations are not cancelled.
    pub fn reset(&mut self) {
        self.ctx.characteristics = ResolvedCharacteristics::default();
        self.ctx.epoch = self.ctx.epoch.wrapping_add(1);
        self.enter(SubscriptionState::Idle);
        debug!("orchestrator reset, epoch {}", self.ctx.epoch);
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn apply(&mut self, input: Input<'_>) -> Effects {
        if let Some(t) = transition(self.state, &self.ctx, input) {
            self.enter(t.next);
            return t.effects;
        }
        match input {
            Input::Subscribe => info!("subscribe ignored in {}", self.state),
            Input::Gatt(event) if self.state.is_terminal() => {
                debug!("late {event:?} ignored in {}", self.state);
            }
            Input::Gatt(event) if event.is_completion() => {
                warn!("unexpected {event:?} ignored in {}", self.state);
            }
            Input::Gatt(_) => {}
        }
        Effects::new()
    }

    fn enter(&mut self, next: SubscriptionState) {
        if next != self.state {
            info!("FSM transition: {} -> {}", self.state, next);
            self.state = next;
        }
    }
}
