//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements                 | Connects to            |
//! |-----------------|----------------------------|------------------------|
//! | `log_sink`      | EventSink                  | `log` facade           |
//! | `time`          | SettleTimer                | std / tokio timer      |
//! | `ble_transport` | GattTransport, SettleTimer | btleplug (`host`)      |

pub mod log_sink;
pub mod time;

#[cfg(feature = "host")]
pub mod ble_transport;
