//! Inbound transport events.
//!
//! Everything the Bluetooth stack reports back to the client arrives as a
//! [`GattEvent`] and is consumed by a single dispatch function,
//! [`BpsService::handle`](crate::app::service::BpsService::handle).
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────┐     ┌───────────────┐
//! │ completion cb    │────▶│             │     │ Orchestrator  │
//! │ value changed cb │────▶│  GattEvent  │────▶│ + decoders    │
//! │ settle timer     │────▶│             │     │               │
//! └──────────────────┘     └─────────────┘     └───────────────┘
//! ```

use core::fmt;

use crate::gatt::{CharHandle, CharacteristicRef};

/// ATT status code attached to a completion. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GattStatus(pub u8);

impl GattStatus {
    pub const SUCCESS: Self = Self(0x00);
    pub const INSUFFICIENT_AUTHENTICATION: Self = Self(0x05);
    pub const UNLIKELY_ERROR: Self = Self(0x0E);

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for GattStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            f.write_str("SUCCESS")
        } else {
            write!(f, "0x{:02X}", self.0)
        }
    }
}

/// Asynchronous notifications from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattEvent {
    /// Service discovery finished; the characteristics of service 0x1810.
    Discovered(Vec<CharacteristicRef>),

    // ── Completions ───────────────────────────────────────
    /// The CCCD write on `characteristic` completed.
    DescriptorWriteComplete {
        characteristic: CharHandle,
        status: GattStatus,
    },
    /// A characteristic write completed.
    CharacteristicWriteComplete {
        characteristic: CharHandle,
        status: GattStatus,
    },
    /// A characteristic read completed. `value` is empty on failure.
    CharacteristicReadComplete {
        characteristic: CharHandle,
        status: GattStatus,
        value: Vec<u8>,
    },

    // ── Data ──────────────────────────────────────────────
    /// Notification or indication received.
    ValueChanged {
        characteristic: CharHandle,
        value: Vec<u8>,
    },

    // ── Timers / link ─────────────────────────────────────
    /// A settle timer requested through `Effect::StartSettleTimer` expired.
    SettleElapsed { epoch: u32 },
    /// Link lost.
    Disconnected,
}

impl GattEvent {
    /// Whether this event completes a previously issued operation.
    pub const fn is_completion(&self) -> bool {
        matches!(
            self,
            Self::DescriptorWriteComplete { .. }
                | Self::CharacteristicWriteComplete { .. }
                | Self::CharacteristicReadComplete { .. }
                | Self::SettleElapsed { .. }
        )
    }
}
