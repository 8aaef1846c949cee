//! Client configuration parameters
//!
//! All tunable parameters for the Blood Pressure client.
//! Values can be overridden from a JSON file or from the command line.

use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Upper bound for the settle delay between the Measurement CCCD and the
/// RACP CCCD write.
pub const MAX_SETTLE_DELAY_MS: u32 = 10_000;
/// Accepted scan window, in seconds.
pub const SCAN_DURATION_RANGE_SECS: core::ops::RangeInclusive<u32> = 1..=120;

/// Per-connection subscription behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between Measurement CCCD success and the RACP CCCD write
    /// (milliseconds). Zero skips the timer.
    pub settle_delay_ms: u32,
    /// Read the Feature characteristic before subscribing, when readable.
    pub read_feature: bool,
    /// Continue into the RACP / Record subscription after Measurement.
    pub enable_record_flow: bool,
    /// Decode single-segment records that embed a 0x2A35 measurement.
    pub decode_embedded_measurements: bool,
}

impl SessionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.settle_delay_ms))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 200,
            read_feature: true,
            enable_record_flow: true,
            decode_embedded_measurements: false,
        }
    }
}

/// Host client configuration: session behaviour plus discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub session: SessionConfig,

    // --- Discovery ---
    /// Scan window before picking a peripheral (seconds)
    pub scan_duration_secs: u32,
    /// Case-insensitive substring matched against the advertised name or
    /// the address. `None` accepts any peripheral advertising 0x1810.
    pub device_filter: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            scan_duration_secs: 10,
            device_filter: None,
        }
    }
}

impl ClientConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            warn!("config parse error: {e}");
            ConfigError::Malformed
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|_| ConfigError::Malformed.into())
    }

    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.session.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(ConfigError::ValidationFailed(
                "settle_delay_ms must be at most 10000",
            ));
        }
        if !SCAN_DURATION_RANGE_SECS.contains(&self.scan_duration_secs) {
            return Err(ConfigError::ValidationFailed(
                "scan_duration_secs must be within 1..=120",
            ));
        }
        if self
            .device_filter
            .as_deref()
            .is_some_and(|f| f.trim().is_empty())
        {
            return Err(ConfigError::ValidationFailed(
                "device_filter must not be blank",
            ));
        }
        Ok(())
    }

    pub fn scan_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.scan_duration_secs))
    }
}
