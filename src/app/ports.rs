//! Port traits, the hexagonal boundary between the client core and the
//! Bluetooth stack.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BpsService (domain)
//! ```
//!
//! Driven adapters (GATT transport, settle timer, event sinks) implement
//! these traits. The [`BpsService`](super::service::BpsService) consumes
//! them via generics, so the core never touches a radio directly.
//!
//! All transport operations are fire-and-forget: `Ok(())` means the
//! operation is now pending and its completion will arrive later as a
//! [`GattEvent`](crate::events::GattEvent). `Err` means it never started.

use std::time::Duration;

use crate::error::TransportError;
use crate::gatt::CharHandle;

// ───────────────────────────────────────────────────────────────
// GATT transport port (driven adapter: domain → radio)
// ───────────────────────────────────────────────────────────────

pub trait GattTransport {
    /// Start a read of `characteristic`. Completes with
    /// `CharacteristicReadComplete`.
    fn read_characteristic(&mut self, characteristic: CharHandle) -> Result<(), TransportError>;

    /// Write `value` to the Client Characteristic Configuration
    /// Descriptor of `characteristic`. Completes with
    /// `DescriptorWriteComplete`.
    fn write_descriptor(
        &mut self,
        characteristic: CharHandle,
        value: &[u8],
    ) -> Result<(), TransportError>;

    /// Write `value` to `characteristic` with response. Completes with
    /// `CharacteristicWriteComplete`.
    fn write_characteristic(
        &mut self,
        characteristic: CharHandle,
        value: &[u8],
    ) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Settle timer port (driven adapter: domain → clock)
// ───────────────────────────────────────────────────────────────

/// One-shot timer answered with `GattEvent::SettleElapsed { epoch }`.
pub trait SettleTimer {
    fn start_settle_timer(&mut self, delay: Duration, epoch: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / UI)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
