//! Command Executor
//!
//! Sends a single command over an established session, validates the
//! response, and retries with linear backoff until it gets a valid value or
//! exhausts its attempts. Every attempt goes out on the wire: the session
//! layer never caches, so addressing side effects always reach the bus.

use crate::command::{Command, Decoded};
use crate::error::LinkError;
use crate::session::VehicleBus;
use std::time::Duration;
use tracing::{debug, warn};

/// Execute one command with up to `max_attempts` tries.
///
/// A response is valid iff the transport returned one, it is non-empty, it
/// is not an adapter error sentinel, and the command's decoder produces a
/// value ([`Command::decode`]). A transport error counts as an invalid
/// attempt, not a fatal one. After failed attempt N the executor sleeps N
/// seconds before attempt N+1.
pub async fn execute<B>(
    bus: &mut B,
    command: &Command,
    max_attempts: u32,
) -> Result<Decoded, LinkError>
where
    B: VehicleBus + ?Sized,
{
    for attempt in 1..=max_attempts {
        match bus.send(command.request).await {
            Ok(raw) => {
                if let Some(decoded) = command.decode(&raw) {
                    debug!("got response from command: {command}");
                    return Ok(decoded);
                }
            }
            Err(err) => {
                warn!("transport error for {command}: {err}");
            }
        }

        if attempt < max_attempts {
            warn!("No valid response for {command}. Retrying in {attempt} second(s)...");
            tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
        }
    }

    Err(LinkError::NoValidResponse {
        command: command.name,
        attempts: max_attempts,
    })
}
