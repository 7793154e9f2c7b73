//! Tempwire Runtime - Acquisition engine
//!
//! One acquisition cycle runs these stages:
//! 1. Read the temperature register through the injected transport
//! 2. Classify the raw register value
//! 3. Update the fault tracker
//! 4. Commit the reading store (value, timestamp, validity, error) at once
//! 5. Publish the value/validity pair to the bound sink, if any
//!
//! `read_synchronous` and `request_async` are two facades over the same
//! cycle; the async facade adds the `Idle -> InFlight -> Complete` phase
//! machine and a staleness bound on in-flight cycles.

pub mod cycle;
pub mod publish;
pub mod engine;

pub use cycle::*;
pub use publish::*;
pub use engine::*;
