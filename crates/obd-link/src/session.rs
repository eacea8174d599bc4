//! Transport Session
//!
//! Owns the serial link to the adapter and exposes the single blocking
//! request/response primitive every command goes through. The bus is a
//! shared half-duplex resource, so requests are strictly serialized by
//! `&mut self` access; nothing on this layer caches responses.

use crate::command::clean_response;
use crate::error::LinkError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No adapter link
    Disconnected,
    /// Adapter link is up but the vehicle has not answered a probe
    Connecting,
    /// Vehicle answered; proprietary queries may proceed
    Connected,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// An established request/response channel to the vehicle bus.
///
/// Implemented by [`SerialSession`] for hardware and by
/// [`mock::MockBus`](crate::mock::MockBus) in tests.
#[async_trait]
pub trait VehicleBus: Send {
    /// Send one request and return the raw response text
    async fn send(&mut self, request: &str) -> Result<String, LinkError>;

    /// Current session status
    fn status(&self) -> SessionStatus;

    /// Whether the vehicle answered the reachability probe
    fn is_reachable(&self) -> bool {
        self.status() == SessionStatus::Connected
    }

    /// Tear the session down; the underlying resource is released at most once
    async fn close(&mut self);
}

/// Session over a serial ELM327-compatible adapter
pub struct SerialSession {
    port: SerialStream,
    device: String,
    status: SessionStatus,
    timeout: Duration,
}

impl SerialSession {
    /// Open the serial port, initialize the adapter, and probe the vehicle.
    ///
    /// An `Ok` session is not necessarily reachable: if the adapter is up
    /// but the vehicle did not answer the probe, the session stays in
    /// `Connecting` and the caller decides whether to retry.
    pub async fn open(
        device: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self, LinkError> {
        debug!("opening serial port {device} at {baud_rate} baud");
        let port = tokio_serial::new(device, baud_rate).open_native_async()?;

        let mut session = Self {
            port,
            device: device.to_string(),
            status: SessionStatus::Connecting,
            timeout,
        };
        session.initialize().await?;
        Ok(session)
    }

    /// Run the ELM327 init sequence and the vehicle probe
    async fn initialize(&mut self) -> Result<(), LinkError> {
        // Reset, then quiet the adapter down: no echo, no linefeeds,
        // automatic protocol selection.
        self.exchange("ATZ").await?;
        self.exchange("ATE0").await?;
        self.exchange("ATL0").await?;
        self.exchange("ATSP0").await?;

        // A mode 01 supported-PIDs request only answers when the vehicle
        // side of the bus is awake.
        let probe = self.exchange("0100").await?;
        if probe_answered(&probe) {
            self.status = SessionStatus::Connected;
            info!("vehicle reachable on {}", self.device);
        } else {
            warn!("adapter on {} is up but vehicle did not answer probe", self.device);
        }
        Ok(())
    }

    /// Write one request and read until the adapter prompt
    async fn exchange(&mut self, request: &str) -> Result<String, LinkError> {
        self.port
            .write_all(format!("{request}\r").as_bytes())
            .await?;

        let port = &mut self.port;
        let raw = tokio::time::timeout(self.timeout, async {
            let mut chunk = [0u8; 256];
            let mut out = Vec::new();
            loop {
                let n = port.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                out.extend_from_slice(&chunk[..n]);
                if out.contains(&b'>') {
                    break;
                }
            }
            Ok::<_, std::io::Error>(out)
        })
        .await
        .map_err(|_| LinkError::Timeout(self.timeout.as_millis() as u64))??;

        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

#[async_trait]
impl VehicleBus for SerialSession {
    async fn send(&mut self, request: &str) -> Result<String, LinkError> {
        if self.status == SessionStatus::Disconnected {
            return Err(LinkError::Serial("session is closed".to_string()));
        }
        debug!("-> {request}");
        let response = self.exchange(request).await?;
        debug!("<- {}", clean_response(&response));
        Ok(response)
    }

    fn status(&self) -> SessionStatus {
        self.status
    }

    async fn close(&mut self) {
        if self.status != SessionStatus::Disconnected {
            info!("closing session on {}", self.device);
            self.status = SessionStatus::Disconnected;
        }
        // The port itself is released when the session is dropped.
    }
}

/// The probe counts as answered when the response opens with the mode 01
/// positive reply `41 00`.
fn probe_answered(raw: &str) -> bool {
    let cleaned: String = clean_response(raw)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    cleaned.to_ascii_uppercase().starts_with("4100")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_detection() {
        assert!(probe_answered("41 00 BE 3F A8 13\r\r>"));
        assert!(probe_answered("SEARCHING...\r41 00 88 18 00 11\r>"));
        assert!(!probe_answered("NO DATA\r>"));
        assert!(!probe_answered("UNABLE TO CONNECT"));
        assert!(!probe_answered(""));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Connected.to_string(), "connected");
        assert_eq!(SessionStatus::Connecting.to_string(), "connecting");
        assert_eq!(SessionStatus::Disconnected.to_string(), "disconnected");
    }
}
