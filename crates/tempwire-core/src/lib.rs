//! Tempwire Core - Fundamental types and primitives
//!
//! This crate defines the pieces of the acquisition core that carry no I/O:
//! - Monotonic timestamps
//! - Register map and request priority
//! - Deci-degree readings (the Reading Store)
//! - The raw value classifier
//! - The consecutive-rejection fault tracker
//! - Sensor configuration and core errors

pub mod time;
pub mod class;
pub mod register;
pub mod reading;
pub mod classify;
pub mod fault;
pub mod config;
pub mod error;

pub use time::*;
pub use class::*;
pub use register::*;
pub use reading::*;
pub use classify::*;
pub use fault::*;
pub use config::*;
pub use error::*;
