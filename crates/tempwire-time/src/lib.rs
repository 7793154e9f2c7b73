//! Tempwire Time - Monotonic clocks
//!
//! The acquisition engine never reads the system clock directly. A clock is
//! injected at construction:
//! - `MonotonicClock`: backed by `std::time::Instant`
//! - `ManualClock`: advanced explicitly, for tests and simulation

pub mod clock;

pub use clock::*;
