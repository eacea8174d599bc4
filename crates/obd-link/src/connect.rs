//! Connection Manager
//!
//! Establishes a vehicle bus session with a bounded number of attempts and
//! linear backoff between them.

use crate::error::LinkError;
use crate::session::{SerialSession, SessionStatus, VehicleBus};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Default number of attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Settings for opening the serial link
#[derive(Debug, Clone)]
pub struct ConnectSettings {
    /// Serial device path (e.g. "/dev/ttyUSB0")
    pub device: String,
    /// Baud rate for the adapter link
    pub baud_rate: u32,
    /// Per-exchange response timeout
    pub timeout: Duration,
    /// Connection attempts before failing the run
    pub max_attempts: u32,
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 38400,
            timeout: Duration::from_secs(30),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Establish a reachable session, retrying up to `max_attempts` times.
///
/// `open` produces a fresh session per attempt; a session that opens but is
/// not reachable counts as a failed attempt and is dropped before the next
/// one, releasing the underlying transport. After failed attempt N the
/// manager sleeps N seconds.
pub async fn connect<B, F, Fut>(mut open: F, max_attempts: u32) -> Result<B, LinkError>
where
    B: VehicleBus,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<B, LinkError>>,
{
    let mut last_status = SessionStatus::Disconnected;

    for attempt in 1..=max_attempts {
        match open().await {
            Ok(bus) => {
                if bus.is_reachable() {
                    info!("vehicle connected on attempt {attempt}");
                    return Ok(bus);
                }
                last_status = bus.status();
            }
            Err(err) => {
                last_status = SessionStatus::Disconnected;
                warn!("connection attempt {attempt} failed: {err}");
            }
        }

        if attempt < max_attempts {
            warn!("{last_status}. Retrying in {attempt} second(s)...");
            tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
        }
    }

    Err(LinkError::NotReachable {
        status: last_status,
        attempts: max_attempts,
    })
}

/// Open a [`SerialSession`] with the configured retry policy
pub async fn connect_serial(settings: &ConnectSettings) -> Result<SerialSession, LinkError> {
    connect(
        || SerialSession::open(&settings.device, settings.baud_rate, settings.timeout),
        settings.max_attempts,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBus;

    #[tokio::test(start_paused = true)]
    async fn test_connect_first_attempt() {
        let mut opened = 0;
        let bus = connect(
            || {
                opened += 1;
                async { Ok(MockBus::healthy()) }
            },
            3,
        )
        .await
        .unwrap();
        assert_eq!(opened, 1);
        assert!(bus.is_reachable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_succeeds_mid_retry() {
        let mut opened = 0;
        let bus = connect(
            || {
                opened += 1;
                let reachable = opened >= 2;
                async move {
                    if reachable {
                        Ok(MockBus::healthy())
                    } else {
                        Ok(MockBus::unreachable())
                    }
                }
            },
            3,
        )
        .await
        .unwrap();
        assert_eq!(opened, 2);
        assert!(bus.is_reachable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_exhausts_attempts() {
        let mut opened = 0;
        let err = connect(
            || {
                opened += 1;
                async { Ok(MockBus::unreachable()) }
            },
            3,
        )
        .await
        .unwrap_err();

        assert_eq!(opened, 3);
        match err {
            LinkError::NotReachable { status, attempts } => {
                assert_eq!(status, SessionStatus::Connecting);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected NotReachable, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_open_error_counts_as_attempt() {
        let mut opened = 0;
        let err = connect::<MockBus, _, _>(
            || {
                opened += 1;
                async { Err(LinkError::Serial("no such device".to_string())) }
            },
            2,
        )
        .await
        .unwrap_err();

        assert_eq!(opened, 2);
        assert!(matches!(err, LinkError::NotReachable { attempts: 2, .. }));
    }
}
