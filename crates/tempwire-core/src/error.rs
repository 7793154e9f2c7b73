//! Error types for Tempwire

use std::time::Duration;

use thiserror::Error;

/// Core Tempwire errors
///
/// Acquisition failures are never errors; they are reported through the
/// reading and fault state. Only misuse of the configuration surfaces here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TempwireError {
    #[error("Invalid device address: {0} (expected 1..=247)")]
    InvalidAddress(u8),

    #[error("Invalid timeout: {0:?} (must be non-zero)")]
    InvalidTimeout(Duration),
}

/// Result type for Tempwire operations
pub type TempwireResult<T> = Result<T, TempwireError>;
