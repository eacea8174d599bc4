//! Cloud Publishing
//!
//! Hands the snapshot of one collection run to an MQTT broker. Exactly one
//! publish attempt per run, QoS 0 with the retain flag set so the broker
//! serves the latest snapshot to new subscribers. Failures are reported to
//! the caller for logging and never abort anything.

use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, QoS, Transport};
use std::time::Duration;
use telemetry::TelemetrySnapshot;
use thiserror::Error;
use tracing::{debug, info};

/// Publish error types
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Publish not flushed within {0}ms")]
    Timeout(u64),
}

/// Broker and topic configuration
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// MQTT broker host
    pub broker_host: String,
    /// MQTT port
    pub broker_port: u16,
    /// Client identifier presented to the broker
    pub client_id: String,
    /// Username, applied together with `password`
    pub username: Option<String>,
    /// Password, applied together with `username`
    pub password: Option<String>,
    /// Prefix for the state topic (e.g. "car/battery/")
    pub topic_prefix: String,
    /// Use the client's default TLS transport instead of plain TCP
    pub tls: bool,
    /// Overall bound on the publish attempt
    pub timeout: Duration,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "battery-telemetry".to_string(),
            username: None,
            password: None,
            topic_prefix: "car/battery/".to_string(),
            tls: false,
            timeout: Duration::from_secs(10),
        }
    }
}

impl PublishConfig {
    /// Topic the retained snapshot is published on
    pub fn state_topic(&self) -> String {
        format!("{}state", self.topic_prefix)
    }
}

/// One-shot snapshot publisher
pub struct SnapshotPublisher {
    config: PublishConfig,
}

impl SnapshotPublisher {
    /// Create a publisher for the configured broker
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    /// Serialize and publish one snapshot.
    ///
    /// The event loop is polled inline until the publish packet has been
    /// written out, bounded by the configured timeout; there is no retry at
    /// this layer.
    pub async fn publish(&self, snapshot: &TelemetrySnapshot) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(snapshot)
            .map_err(|e| PublishError::Serialization(e.to_string()))?;

        let mut options = MqttOptions::new(
            &self.config.client_id,
            &self.config.broker_host,
            self.config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            options.set_credentials(user, pass);
        }
        if self.config.tls {
            options.set_transport(Transport::tls_with_default_config());
        }

        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let topic = self.config.state_topic();

        client
            .publish(&topic, QoS::AtMostOnce, true, payload)
            .await
            .map_err(|e| PublishError::Publish(e.to_string()))?;

        let flush = async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Publish(_))) => break Ok(()),
                    Ok(event) => debug!("mqtt event: {event:?}"),
                    Err(err) => break Err(PublishError::Connection(err.to_string())),
                }
            }
        };
        tokio::time::timeout(self.config.timeout, flush)
            .await
            .map_err(|_| PublishError::Timeout(self.config.timeout.as_millis() as u64))??;

        // Clean session end; best effort, the packet is already out.
        let _ = client.disconnect().await;
        let drain = async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };
        let _ = tokio::time::timeout(Duration::from_secs(1), drain).await;

        info!(
            "snapshot with {} field(s) published to {topic}",
            snapshot.len()
        );
        Ok(())
    }
}
