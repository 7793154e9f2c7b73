//! Request function codes and priority class

/// Modbus function code understood by the acquisition core
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum FunctionCode {
    /// Read Holding Registers
    ReadHoldingRegisters = 0x03,
    /// Read Input Registers
    ReadInputRegisters = 0x04,
}

impl FunctionCode {
    /// Parse from wire byte
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x03 => Some(FunctionCode::ReadHoldingRegisters),
            0x04 => Some(FunctionCode::ReadInputRegisters),
            _ => None,
        }
    }

    /// Convert to wire byte
    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Priority class the bus stack attaches to a request
///
/// The core only issues measurement reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RequestPriority {
    /// Safety-relevant measurement data
    #[default]
    Sensor,
}
