use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Address;

/// Errors loading a [`HubConfig`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration was not valid JSON or had the wrong shape.
    #[error("Configuration is not valid JSON")]
    Json {
        /// The underlying parse error.
        #[from]
        source: serde_json::Error,
    },

    /// The lights address or a scan bound does not fit in seven bits.
    #[error("Address 0x{:02X} is not a 7-bit bus address", address)]
    InvalidAddress {
        /// The rejected address.
        address: u8,
    },
}

/// Configuration for the hub program that hosts a lights module.
///
/// Every field has a default, so `{}` is a complete configuration.
///
/// # Examples
///
/// ```
/// use picolights::{Address, HubConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = HubConfig::from_json(r#"{"lights": {"address": 66}, "debug": {"verbosity": 1}}"#)?;
/// assert!(config.lights.enabled);
/// assert_eq!(Address(0x42), config.lights.address());
/// assert_eq!("debug", config.log_filter());
/// # Ok(()) }
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HubConfig {
    /// The lights module.
    pub lights: LightsConfig,

    /// The bus the module sits on.
    pub bus: BusConfig,

    /// Diagnostic output.
    pub debug: DebugConfig,
}

/// Configuration for the lights module.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LightsConfig {
    /// Whether to bring the module up at all.
    pub enabled: bool,

    /// 7-bit bus address of the module.
    pub address: u8,
}

impl LightsConfig {
    /// The module's address.
    pub fn address(&self) -> Address {
        Address(self.address)
    }
}

impl Default for LightsConfig {
    fn default() -> Self {
        LightsConfig {
            enabled: true,
            address: Address::default().0,
        }
    }
}

/// Configuration for the I2C bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Clock frequency, for HAL implementations that take one.
    pub frequency_hz: u32,

    /// First address probed when scanning.
    pub scan_start: u8,

    /// Last address probed when scanning.
    pub scan_end: u8,
}

impl BusConfig {
    /// The addresses probed when scanning, for [`I2cLightBus::with_scan_range`](crate::I2cLightBus::with_scan_range).
    ///
    /// Empty if `scan_start` is above `scan_end`.
    pub fn scan_range(&self) -> RangeInclusive<u8> {
        self.scan_start..=self.scan_end
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            frequency_hz: 100_000,
            scan_start: 0x08,
            scan_end: 0x77,
        }
    }
}

/// Configuration for diagnostic output.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Whether to log anything.
    pub enabled: bool,

    /// 0 logs milestones, 1 adds bus traffic, 2 and up log everything.
    pub verbosity: u8,
}

impl Default for DebugConfig {
    fn default() -> Self {
        DebugConfig {
            enabled: true,
            verbosity: 0,
        }
    }
}

impl HubConfig {
    /// Parses a JSON configuration, filling in defaults for anything missing.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * [`ConfigError::Json`] if `json` does not parse.
    /// * [`ConfigError::InvalidAddress`] if the lights address or either end of the scan range is above 0x7F.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: HubConfig = serde_json::from_str(json)?;
        let addresses = [config.lights.address, config.bus.scan_start, config.bus.scan_end];
        if let Some(&address) = addresses.iter().find(|&&address| address > Address::MAX) {
            return Err(ConfigError::InvalidAddress { address });
        }
        Ok(config)
    }

    /// The `env_logger` filter matching the debug settings.
    pub fn log_filter(&self) -> &'static str {
        match (self.debug.enabled, self.debug.verbosity) {
            (false, _) => "off",
            (true, 0) => "info",
            (true, 1) => "debug",
            (true, _) => "trace",
        }
    }
}
