//! Mock Vehicle Bus
//!
//! Scripted bus for tests: canned per-request responses plus a request log
//! so tests can assert exactly what went out on the wire. No hardware
//! required.

use crate::command;
use crate::error::LinkError;
use crate::session::{SessionStatus, VehicleBus};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    TransportError,
}

/// Simulated vehicle bus with scripted responses
#[derive(Debug, Default)]
pub struct MockBus {
    reachable: bool,
    closed: bool,
    replies: HashMap<String, Reply>,
    /// Every request sent, in order
    pub requests: Vec<String>,
}

impl MockBus {
    /// A reachable bus where every catalog command answers with a valid
    /// response: `OK` for adapter commands, plausible frames for values.
    pub fn healthy() -> Self {
        let mut bus = Self {
            reachable: true,
            ..Self::default()
        };
        for cmd in command::CATALOG {
            if cmd.request.starts_with("AT") {
                bus.script(cmd.request, "OK\r\r>");
            }
        }
        bus.script(command::BAT_SOC.request, "62 83 34 A9\r\r>"); // 84.5 %
        bus.script(command::AMBIENT_AIR_TEMP.request, "62 00 46 3C\r\r>"); // 20.0 °C
        bus.script(command::BAT_COOLANT_TEMP.request, "62 41 A4 42\r\r>"); // 26.0 °C
        bus.script(command::AC_VOLTAGE.request, "62 43 68 09 10\r\r>"); // 232.0 V
        bus.script(command::AC_CURRENT.request, "62 43 69 FF 9C\r\r>"); // -10.0 A
        bus.script(command::CHARGING_LEVEL.request, "62 45 31 40\r\r>"); // 32.0 %
        bus
    }

    /// A bus whose vehicle never answers the probe
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Override the response for one request
    pub fn respond(mut self, request: &str, response: &str) -> Self {
        self.script(request, response);
        self
    }

    /// Make one request fail at the transport layer
    pub fn fail(mut self, request: &str) -> Self {
        self.replies
            .insert(request.to_string(), Reply::TransportError);
        self
    }

    /// Number of times `request` was sent
    pub fn sent_count(&self, request: &str) -> usize {
        self.requests.iter().filter(|r| r == &request).count()
    }

    fn script(&mut self, request: &str, response: &str) {
        self.replies
            .insert(request.to_string(), Reply::Text(response.to_string()));
    }
}

#[async_trait]
impl VehicleBus for MockBus {
    async fn send(&mut self, request: &str) -> Result<String, LinkError> {
        self.requests.push(request.to_string());
        match self.replies.get(request) {
            Some(Reply::Text(response)) => Ok(response.clone()),
            Some(Reply::TransportError) => {
                Err(LinkError::Serial("simulated transport failure".to_string()))
            }
            None => Ok("NO DATA\r\r>".to_string()),
        }
    }

    fn status(&self) -> SessionStatus {
        if self.closed {
            SessionStatus::Disconnected
        } else if self.reachable {
            SessionStatus::Connected
        } else {
            SessionStatus::Connecting
        }
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_healthy_bus_answers_catalog() {
        let mut bus = MockBus::healthy();
        for cmd in command::CATALOG {
            let raw = bus.send(cmd.request).await.unwrap();
            assert!(cmd.decode(&raw).is_some(), "{} should decode", cmd.name);
        }
    }

    #[tokio::test]
    async fn test_request_log_and_close() {
        let mut bus = MockBus::healthy();
        bus.send("ATSH7E4").await.unwrap();
        bus.send("228334").await.unwrap();
        assert_eq!(bus.requests, vec!["ATSH7E4", "228334"]);
        assert_eq!(bus.sent_count("228334"), 1);

        assert!(bus.is_reachable());
        bus.close().await;
        assert_eq!(bus.status(), SessionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_unscripted_request_gets_no_data() {
        let mut bus = MockBus::healthy();
        let raw = bus.send("22FFFF").await.unwrap();
        assert!(raw.contains("NO DATA"));
    }
}
