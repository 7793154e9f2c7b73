//! Sensor configuration

use std::time::Duration;

use crate::{TempwireError, TempwireResult, MAX_DEVICE_ADDRESS, MIN_DEVICE_ADDRESS};

/// Acquisition target configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorConfig {
    /// Modbus server address (1..=247)
    pub address: u8,
    /// Response timeout, also the staleness bound for async cycles
    pub timeout: Duration,
    /// Retries the transport may spend on one request. The core itself
    /// issues exactly one read per cycle.
    pub retries: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig {
            address: 3,
            timeout: Duration::from_millis(200),
            retries: 3,
        }
    }
}

impl SensorConfig {
    /// Default configuration for a sensor at `address`
    pub fn new(address: u8) -> TempwireResult<Self> {
        let config = SensorConfig {
            address,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Long RS485 runs or busy buses
    pub fn slow_bus() -> Self {
        SensorConfig {
            timeout: Duration::from_millis(1000),
            ..Default::default()
        }
    }

    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Check the address range and timeout
    pub fn validate(&self) -> TempwireResult<()> {
        if !(MIN_DEVICE_ADDRESS..=MAX_DEVICE_ADDRESS).contains(&self.address) {
            return Err(TempwireError::InvalidAddress(self.address));
        }
        if self.timeout.is_zero() {
            return Err(TempwireError::InvalidTimeout(self.timeout));
        }
        Ok(())
    }
}
