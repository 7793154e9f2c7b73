//! Bus-level failures reported by a register transport

use thiserror::Error;

/// Transport failure
///
/// The acquisition core treats every variant the same way: the read
/// failed, keep the last good value. The `Display` text is surfaced
/// verbatim as the reading's error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    // Modbus exception responses
    #[error("Illegal function")]
    IllegalFunction,

    #[error("Illegal data address")]
    IllegalDataAddress,

    #[error("Illegal data value")]
    IllegalDataValue,

    #[error("Slave device failure")]
    SlaveDeviceFailure,

    // Line errors
    #[error("Timeout")]
    Timeout,

    #[error("CRC error")]
    CrcError,

    #[error("Invalid response")]
    InvalidResponse,

    #[error("Invalid data length: {0} bytes")]
    InvalidDataLength(usize),

    // Stack errors
    #[error("Queue full")]
    QueueFull,

    #[error("Not initialized")]
    NotInitialized,

    #[error("Device not found")]
    DeviceNotFound,

    #[error("Communication error: {0}")]
    Communication(String),
}

impl TransportError {
    /// Map a Modbus exception code (1..=4) to its error
    pub fn from_exception_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(TransportError::IllegalFunction),
            0x02 => Some(TransportError::IllegalDataAddress),
            0x03 => Some(TransportError::IllegalDataValue),
            0x04 => Some(TransportError::SlaveDeviceFailure),
            _ => None,
        }
    }

    /// Did the device answer at all?
    pub fn is_device_exception(&self) -> bool {
        matches!(
            self,
            TransportError::IllegalFunction
                | TransportError::IllegalDataAddress
                | TransportError::IllegalDataValue
                | TransportError::SlaveDeviceFailure
        )
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_codes() {
        assert_eq!(
            TransportError::from_exception_code(2),
            Some(TransportError::IllegalDataAddress)
        );
        assert_eq!(TransportError::from_exception_code(0x0B), None);
        assert!(TransportError::SlaveDeviceFailure.is_device_exception());
        assert!(!TransportError::Timeout.is_device_exception());
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(TransportError::Timeout.to_string(), "Timeout");
        assert_eq!(TransportError::CrcError.to_string(), "CRC error");
        assert_eq!(
            TransportError::Communication("UART overrun".into()).to_string(),
            "Communication error: UART overrun"
        );
    }
}
