//! Value classifier - raw register payload to trusted temperature
//!
//! The sensor reports `0x0000` on an internal fault, so a true 0.0°C can
//! never be reported. A stale reading is preferred over a false freezing
//! one; do not relax this without re-verifying the device's error
//! semantics.

use thiserror::Error;

use crate::{DeciCelsius, SENTINEL_ALL_ONES, SENTINEL_ZERO, TEMP_MAX, TEMP_MIN};

/// Which sentinel the device emitted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultReason {
    /// `0x0000`: internal or communication fault
    ZeroValue,
    /// `0xFFFF`: no response / bus fault
    AllOnes,
}

impl FaultReason {
    /// Short machine-friendly reason
    pub fn as_str(self) -> &'static str {
        match self {
            FaultReason::ZeroValue => "zero-value",
            FaultReason::AllOnes => "all-ones",
        }
    }

    /// The raw pattern behind this reason
    pub fn raw(self) -> u16 {
        match self {
            FaultReason::ZeroValue => SENTINEL_ZERO,
            FaultReason::AllOnes => SENTINEL_ALL_ONES,
        }
    }
}

/// Result of classifying one raw register value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Within the physical envelope
    Valid(DeciCelsius),
    /// Device emitted a sentinel
    SensorFault(FaultReason),
    /// Outside -40.0°C..=+125.0°C, carries the signed value
    RangeViolation(i16),
}

/// Why a raw value was refused
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    #[error("Sensor returned 0x0000")]
    ZeroValue,

    #[error("Modbus error 0xFFFF")]
    AllOnes,

    #[error("Temperature out of range ({0})")]
    OutOfRange(i16),
}

impl Rejection {
    pub fn is_sensor_fault(self) -> bool {
        matches!(self, Rejection::ZeroValue | Rejection::AllOnes)
    }
}

impl Classification {
    #[inline]
    pub fn is_valid(self) -> bool {
        matches!(self, Classification::Valid(_))
    }

    /// Valid temperature or the refusal reason
    pub fn into_result(self) -> Result<DeciCelsius, Rejection> {
        match self {
            Classification::Valid(v) => Ok(v),
            Classification::SensorFault(FaultReason::ZeroValue) => Err(Rejection::ZeroValue),
            Classification::SensorFault(FaultReason::AllOnes) => Err(Rejection::AllOnes),
            Classification::RangeViolation(v) => Err(Rejection::OutOfRange(v)),
        }
    }
}

/// Classify a raw 16-bit register payload
pub const fn classify(raw: u16) -> Classification {
    if raw == SENTINEL_ZERO {
        return Classification::SensorFault(FaultReason::ZeroValue);
    }
    if raw == SENTINEL_ALL_ONES {
        return Classification::SensorFault(FaultReason::AllOnes);
    }

    let value = raw as i16;
    if value < TEMP_MIN || value > TEMP_MAX {
        Classification::RangeViolation(value)
    } else {
        Classification::Valid(DeciCelsius::new(value))
    }
}
