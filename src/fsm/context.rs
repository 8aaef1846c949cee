//! Read-only context handed to every transition handler.
//!
//! `SessionContext` holds what the handlers need to decide the next step:
//! the characteristics resolved for this connection, the subscription
//! options and the current settle-timer epoch. Handlers never mutate it;
//! only the [`Orchestrator`](super::Orchestrator) does, on attach and
//! reset.

use std::time::Duration;

use crate::config::SessionConfig;
use crate::gatt::{CharHandle, CharacteristicRole, ResolvedCharacteristics};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    /// Characteristics resolved after discovery. Empty until attached.
    pub characteristics: ResolvedCharacteristics,
    /// Delay between Measurement CCCD success and the RACP CCCD write.
    pub settle_delay: Duration,
    /// Read the Feature characteristic first, when it is readable.
    pub read_feature: bool,
    /// Continue into the RACP / Record subscription.
    pub record_flow: bool,
    /// Bumped on every reset; settle expiries from an older epoch are
    /// stale.
    pub epoch: u32,
}

impl SessionContext {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            characteristics: ResolvedCharacteristics::default(),
            settle_delay: config.settle_delay(),
            read_feature: config.read_feature,
            record_flow: config.enable_record_flow,
            epoch: 0,
        }
    }

    pub fn handle(&self, role: CharacteristicRole) -> Option<CharHandle> {
        self.characteristics.handle(role)
    }

    /// Record flow is both configured and possible on this peripheral.
    pub fn record_flow_enabled(&self) -> bool {
        self.record_flow && self.characteristics.record_flow_available()
    }
}
