//! Client core: pure domain logic, zero I/O.
//!
//! This module contains the rules of a Blood Pressure client session:
//! driving the subscription orchestrator and routing received values to
//! the decoders. All interaction with the Bluetooth stack happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without a radio.

pub mod events;
pub mod ports;
pub mod service;
