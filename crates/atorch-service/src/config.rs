//! Service configuration.

use std::path::Path;
use std::time::Duration;

use atorch_packet::DEFAULT_CO2_FACTOR;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Configuration for a meter connection.
///
/// Every field has a default, so a YAML file only needs the keys it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// TCP address of the BLE-UART bridge.
    pub address: String,
    /// Grams of CO2 per milli-watt-hour.
    pub co2_factor: f64,
    /// Keep reconnecting after the bridge drops the connection.
    pub reconnect: bool,
    /// Delay between reconnect attempts, in milliseconds.
    pub retry_interval_ms: u64,
    /// Maximum bytes taken per transport read.
    pub read_buffer_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            address: "127.0.0.1:7777".to_string(),
            co2_factor: DEFAULT_CO2_FACTOR,
            reconnect: true,
            retry_interval_ms: 1000,
            read_buffer_size: 64,
        }
    }
}

impl ServiceConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> ServiceResult<Self> {
        let config: ServiceConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Check that values are usable.
    pub fn validate(&self) -> ServiceResult<()> {
        if !self.co2_factor.is_finite() || self.co2_factor < 0.0 {
            return Err(ServiceError::InvalidConfig(format!(
                "co2_factor must be a non-negative number, got {}",
                self.co2_factor
            )));
        }
        if self.read_buffer_size == 0 {
            return Err(ServiceError::InvalidConfig(
                "read_buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.address.is_empty() {
            return Err(ServiceError::InvalidConfig("address is empty".to_string()));
        }
        Ok(())
    }

    /// Delay between reconnect attempts.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ServiceConfig::from_yaml_str("address: 192.168.1.20:9000\nreconnect: false\n")
            .expect("valid config");
        assert_eq!(config.address, "192.168.1.20:9000");
        assert!(!config.reconnect);
        assert_eq!(config.co2_factor, DEFAULT_CO2_FACTOR);
        assert_eq!(config.retry_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ServiceConfig::from_yaml_str("co2_factor: -1.0"),
            Err(ServiceError::InvalidConfig(_))
        ));
        assert!(matches!(
            ServiceConfig::from_yaml_str("read_buffer_size: 0"),
            Err(ServiceError::InvalidConfig(_))
        ));
        assert!(matches!(
            ServiceConfig::from_yaml_str("reconnect: [1, 2]"),
            Err(ServiceError::Config(_))
        ));
    }
}
