//! Blood Pressure Service (0x1810) GATT client library.
//!
//! Exposes the pure-logic modules (decoders, subscription state machine,
//! application service) for integration testing and embedding. The
//! btleplug transport is guarded by the `host` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod gatt;

pub use error::{Error, Result};
