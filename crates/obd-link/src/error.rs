//! Link Error Types

use crate::session::SessionStatus;
use thiserror::Error;

/// Errors that can occur on the OBD-II link
#[derive(Debug, Error)]
pub enum LinkError {
    /// Serial port connection error
    #[error("Serial port error: {0}")]
    Serial(String),

    /// Timeout waiting for the adapter prompt
    #[error("Timeout waiting for adapter response after {0}ms")]
    Timeout(u64),

    /// Vehicle never became reachable; fatal to the collection run
    #[error("Vehicle not reachable after {attempts} connection attempt(s), last status: {status}")]
    NotReachable {
        status: SessionStatus,
        attempts: u32,
    },

    /// A command never produced a valid response; recoverable per field
    #[error("No valid response for {command} after {attempts} attempt(s)")]
    NoValidResponse {
        command: &'static str,
        attempts: u32,
    },

    /// An addressing command failed, leaving the bus misconfigured for the
    /// value query that would have followed
    #[error("Bus addressing failed at {command} after {attempts} attempt(s)")]
    Addressing {
        command: &'static str,
        attempts: u32,
    },

    /// Anything outside the taxonomy above
    #[error("Unexpected link failure: {0}")]
    Unexpected(String),
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Serial(err.to_string())
    }
}

impl From<tokio_serial::Error> for LinkError {
    fn from(err: tokio_serial::Error) -> Self {
        LinkError::Serial(err.to_string())
    }
}
