//! Register map of the wall-mount RS485 temperature sensor
//!
//! Temperature lives in a single input register, signed, in tenths of a
//! degree Celsius. Addressing is zero-based.

use crate::FunctionCode;

/// Temperature input register (0x0032)
pub const TEMP_REGISTER: u16 = 50;

/// Function code used for the temperature read
pub const TEMP_FUNCTION: FunctionCode = FunctionCode::ReadInputRegisters;

/// Registers requested per read
pub const REGISTER_COUNT: u16 = 1;

/// Lowest temperature the sensor can report: -40.0°C
pub const TEMP_MIN: i16 = -400;

/// Highest temperature the sensor can report: +125.0°C
pub const TEMP_MAX: i16 = 1250;

/// Raw value the device emits on an internal or communication fault
pub const SENTINEL_ZERO: u16 = 0x0000;

/// Canonical "no response" pattern on the bus
pub const SENTINEL_ALL_ONES: u16 = 0xFFFF;

/// Lowest valid Modbus server address
pub const MIN_DEVICE_ADDRESS: u8 = 1;

/// Highest valid Modbus server address
pub const MAX_DEVICE_ADDRESS: u8 = 247;
