//! Tempwire Test Harness - Chaos testing and engine validation
//!
//! This crate provides:
//! - A seeded chaos transport (bus errors, sensor sentinels, range faults)
//! - A scenario runner that checks engine invariants after every cycle
//! - Benchmarks for the classifier and the acquisition cycle

pub mod chaos;
pub mod scenario;

pub use chaos::*;
pub use scenario::*;
