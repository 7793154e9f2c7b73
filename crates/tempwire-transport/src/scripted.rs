//! Scripted transport - replays queued replies in order

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{decode_register_payload, ReadRequest, RegisterTransport, TransportError, TransportResult};

#[derive(Debug)]
struct Script {
    replies: VecDeque<TransportResult<Vec<u16>>>,
    requests: Vec<ReadRequest>,
    /// Reply once the queue is empty
    exhausted: TransportError,
}

/// Transport that answers from a queue of prepared replies
///
/// Clones share the script, so a test can keep feeding replies after the
/// engine has taken ownership of its copy.
#[derive(Clone, Debug)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    /// Empty script; reads time out until replies are queued
    pub fn new() -> Self {
        ScriptedTransport {
            script: Arc::new(Mutex::new(Script {
                replies: VecDeque::new(),
                requests: Vec::new(),
                exhausted: TransportError::Timeout,
            })),
        }
    }

    /// Queue a single-register reply
    pub fn push_register(&self, raw: u16) -> &Self {
        self.script.lock().replies.push_back(Ok(vec![raw]));
        self
    }

    /// Queue a multi-register reply (may be empty)
    pub fn push_registers(&self, registers: Vec<u16>) -> &Self {
        self.script.lock().replies.push_back(Ok(registers));
        self
    }

    /// Queue a reply given as wire bytes
    pub fn push_payload(&self, payload: &[u8]) -> &Self {
        self.script
            .lock()
            .replies
            .push_back(decode_register_payload(payload));
        self
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: TransportError) -> &Self {
        self.script.lock().replies.push_back(Err(error));
        self
    }

    /// Error returned once the script runs dry
    pub fn set_exhausted_error(&self, error: TransportError) {
        self.script.lock().exhausted = error;
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.lock().replies.len()
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<ReadRequest> {
        self.script.lock().requests.clone()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterTransport for ScriptedTransport {
    fn read_registers(&mut self, request: &ReadRequest) -> TransportResult<Vec<u16>> {
        let mut script = self.script.lock();
        script.requests.push(*request);
        match script.replies.pop_front() {
            Some(reply) => reply,
            None => {
                tracing::debug!("script exhausted for device {}", request.device);
                Err(script.exhausted.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replies_in_order() {
        let mut transport = ScriptedTransport::new();
        transport
            .push_register(0x0108)
            .push_error(TransportError::CrcError)
            .push_payload(&[0xFE, 0x70]);

        let request = ReadRequest::temperature(3);
        assert_eq!(transport.read_registers(&request), Ok(vec![0x0108]));
        assert_eq!(
            transport.read_registers(&request),
            Err(TransportError::CrcError)
        );
        assert_eq!(transport.read_registers(&request), Ok(vec![0xFE70]));
        assert_eq!(
            transport.read_registers(&request),
            Err(TransportError::Timeout)
        );
    }

    #[test]
    fn test_clones_share_script() {
        let feeder = ScriptedTransport::new();
        let mut reader = feeder.clone();

        feeder.push_register(250);
        assert_eq!(feeder.remaining(), 1);
        assert_eq!(
            reader.read_registers(&ReadRequest::temperature(9)),
            Ok(vec![250])
        );
        assert_eq!(feeder.remaining(), 0);
        assert_eq!(feeder.requests()[0].device, 9);
    }

    #[test]
    fn test_bad_payload_becomes_error() {
        let mut transport = ScriptedTransport::new();
        transport.push_payload(&[0x01, 0x02, 0x03]);
        assert_eq!(
            transport.read_registers(&ReadRequest::temperature(1)),
            Err(TransportError::InvalidDataLength(3))
        );
    }

    #[test]
    fn test_exhausted_error_configurable() {
        let mut transport = ScriptedTransport::new();
        transport.set_exhausted_error(TransportError::DeviceNotFound);
        assert_eq!(
            transport.read_registers(&ReadRequest::temperature(1)),
            Err(TransportError::DeviceNotFound)
        );
    }
}
