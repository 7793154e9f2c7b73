//! Register read requests and the transport contract

use tempwire_core::{FunctionCode, RequestPriority, REGISTER_COUNT, TEMP_FUNCTION, TEMP_REGISTER};

use crate::TransportResult;

/// One register read, as handed to the bus stack
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadRequest {
    /// Modbus server address
    pub device: u8,
    pub function: FunctionCode,
    /// First register, zero-based
    pub register: u16,
    /// Number of registers
    pub count: u16,
    pub priority: RequestPriority,
}

impl ReadRequest {
    /// The temperature read: FC 0x04, register 50, one register, sensor priority
    pub fn temperature(device: u8) -> Self {
        ReadRequest {
            device,
            function: TEMP_FUNCTION,
            register: TEMP_REGISTER,
            count: REGISTER_COUNT,
            priority: RequestPriority::Sensor,
        }
    }
}

/// Bus stack that can read registers from a device
///
/// Implementations own framing, CRC, retries and timeouts. A call must
/// return within the stack's own timeout; the engine never blocks on
/// anything else.
pub trait RegisterTransport: Send {
    fn read_registers(&mut self, request: &ReadRequest) -> TransportResult<Vec<u16>>;
}

impl<T: RegisterTransport + ?Sized> RegisterTransport for Box<T> {
    fn read_registers(&mut self, request: &ReadRequest) -> TransportResult<Vec<u16>> {
        (**self).read_registers(request)
    }
}
