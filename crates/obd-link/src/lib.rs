//! OBD-II Link Layer
//!
//! This crate provides async serial communication with ELM327-compatible
//! OBD-II adapters, a bounded-retry connection manager, and a validating
//! command executor. Proprietary module data is read with UDS service 0x22
//! requests after selecting the module's CAN header and receive address.

pub mod command;
mod connect;
mod error;
mod executor;
pub mod mock;
mod session;

pub use command::{Command, Decoded, Decoder};
pub use connect::{connect, connect_serial, ConnectSettings, DEFAULT_MAX_ATTEMPTS};
pub use error::LinkError;
pub use executor::execute;
pub use session::{SerialSession, SessionStatus, VehicleBus};
