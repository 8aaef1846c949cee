//! Unified error types for the Blood Pressure client.
//!
//! A single `Error` enum that every subsystem can convert into. All
//! variants are `Copy` so they can be carried inside state-machine states
//! and application events without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A characteristic payload could not be decoded.
    Decode(DecodeError),
    /// The transport refused or failed an operation.
    Transport(TransportError),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Errors produced by the payload decoders.
///
/// Decode errors are local and non-fatal: the offending value is dropped
/// and the subscription flow carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload is shorter than its format (or its flags) require.
    TooShort { needed: usize, available: usize },
    /// A Record Access Control Point indication carried an op-code this
    /// client does not decode.
    UnsupportedOpCode(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { needed, available } => {
                write!(f, "payload too short: need {needed} bytes, have {available}")
            }
            Self::UnsupportedOpCode(op) => write!(f, "unsupported RACP op-code 0x{op:02X}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Synchronous refusal of a transport operation (the "pending" could not
/// be created). Asynchronous failures arrive as a non-success
/// [`GattStatus`](crate::events::GattStatus) on the completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No peripheral is connected.
    NotConnected,
    /// The handle does not name a characteristic known to the transport.
    UnknownCharacteristic,
    /// The characteristic has no Client Characteristic Configuration
    /// Descriptor.
    DescriptorMissing,
    /// Another operation is still outstanding.
    Busy,
    /// Generic I/O error from the Bluetooth stack.
    Io,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::UnknownCharacteristic => write!(f, "unknown characteristic"),
            Self::DescriptorMissing => write!(f, "CCCD missing"),
            Self::Busy => write!(f, "operation already in flight"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed configuration"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
