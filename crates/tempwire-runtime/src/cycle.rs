//! Cycle phases and outcomes

use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;

use tempwire_core::{DeciCelsius, Rejection};
use tempwire_transport::TransportError;

/// Phase of the asynchronous facade
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CyclePhase {
    /// No async cycle outstanding
    Idle = 0,
    /// A cycle was requested and has not finished
    InFlight = 1,
    /// A cycle finished and its result has not been fetched
    Complete = 2,
}

impl CyclePhase {
    fn from_u8(b: u8) -> Self {
        match b {
            1 => CyclePhase::InFlight,
            2 => CyclePhase::Complete,
            _ => CyclePhase::Idle,
        }
    }
}

/// Atomic holder for `CyclePhase`
#[derive(Debug)]
pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub(crate) fn new() -> Self {
        PhaseCell(AtomicU8::new(CyclePhase::Idle as u8))
    }

    pub(crate) fn load(&self) -> CyclePhase {
        CyclePhase::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, phase: CyclePhase) {
        self.0.store(phase as u8, Ordering::Release);
    }

    /// Move `from -> to`; false if another caller moved first
    pub(crate) fn transition(&self, from: CyclePhase, to: CyclePhase) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Why a cycle did not produce a value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("No data returned")]
    NoData,

    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Async cycle exceeded the configured timeout
    #[error("Timeout")]
    Abandoned,

    /// Async cycle found the bus still held by an abandoned read
    #[error("Bus busy")]
    BusBusy,
}

impl CycleFailure {
    /// Did the device answer with a value the classifier refused?
    pub fn is_rejection(&self) -> bool {
        matches!(self, CycleFailure::Rejected(_))
    }
}

/// Result of one cycle
pub type CycleOutcome = Result<DeciCelsius, CycleFailure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        let cell = PhaseCell::new();
        assert_eq!(cell.load(), CyclePhase::Idle);

        assert!(cell.transition(CyclePhase::Idle, CyclePhase::InFlight));
        assert!(!cell.transition(CyclePhase::Idle, CyclePhase::InFlight));
        assert_eq!(cell.load(), CyclePhase::InFlight);

        cell.store(CyclePhase::Complete);
        assert_eq!(cell.load(), CyclePhase::Complete);
    }

    #[test]
    fn test_failure_messages_are_verbatim() {
        assert_eq!(
            CycleFailure::from(TransportError::CrcError).to_string(),
            "CRC error"
        );
        assert_eq!(
            CycleFailure::from(Rejection::ZeroValue).to_string(),
            "Sensor returned 0x0000"
        );
        assert_eq!(CycleFailure::NoData.to_string(), "No data returned");
        assert_eq!(CycleFailure::Abandoned.to_string(), "Timeout");
        assert_eq!(CycleFailure::BusBusy.to_string(), "Bus busy");
        assert!(CycleFailure::from(Rejection::OutOfRange(2000)).is_rejection());
        assert!(!CycleFailure::NoData.is_rejection());
    }
}
