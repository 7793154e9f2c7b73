//! Tempwire Transport Layer - the bus as seen by the acquisition core
//!
//! This crate provides:
//! - The `RegisterTransport` contract the engine drives
//! - Bus error taxonomy (`TransportError`)
//! - Big-endian register payload decoding
//! - A scripted transport for tests and demos
//!
//! Framing, CRC and line timing belong to the concrete bus stack and are
//! not implemented here.

pub mod error;
pub mod request;
pub mod payload;
pub mod scripted;

pub use error::*;
pub use request::*;
pub use payload::*;
pub use scripted::ScriptedTransport;
