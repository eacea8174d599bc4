//! Process Configuration
//!
//! Loaded once at startup and immutable afterwards. Sources are layered:
//! built-in defaults, then an optional config file, then environment
//! variables with a `TELEMETRY` prefix (e.g. `TELEMETRY_MQTT__BROKER`).

use cloud_publish::PublishConfig;
use config::{Config, ConfigError, Environment, File};
use obd_link::ConnectSettings;
use serde::Deserialize;
use std::time::Duration;

/// Serial adapter settings
#[derive(Debug, Clone, Deserialize)]
pub struct SerialSettings {
    /// Serial device path
    pub port: String,
    /// Adapter baud rate
    pub baud_rate: u32,
    /// Per-exchange response timeout in seconds
    pub timeout_secs: u64,
    /// Connection attempts before giving up on the vehicle
    pub max_attempts: u32,
}

/// MQTT broker settings
#[derive(Debug, Clone, Deserialize)]
pub struct MqttSettings {
    pub broker: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: String,
    pub topic_prefix: String,
    /// Use TLS transport to the broker
    pub tls: bool,
    pub publish_timeout_secs: u64,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Directory for the rotating log file
    pub directory: String,
    /// Default level filter when RUST_LOG is not set
    pub level: String,
}

/// Top-level process settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub serial: SerialSettings,
    pub mqtt: MqttSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Load settings from defaults, `path` (any supported format, optional),
    /// and the environment.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("serial.port", "/dev/ttyUSB0")?
            .set_default("serial.baud_rate", 38400)?
            .set_default("serial.timeout_secs", 30)?
            .set_default("serial.max_attempts", 3)?
            .set_default("mqtt.broker", "localhost")?
            .set_default("mqtt.port", 1883)?
            .set_default("mqtt.client_id", "battery-telemetry")?
            .set_default("mqtt.topic_prefix", "car/battery/")?
            .set_default("mqtt.tls", false)?
            .set_default("mqtt.publish_timeout_secs", 10)?
            .set_default("log.directory", "logs")?
            .set_default("log.level", "info")?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("TELEMETRY").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Connection settings for the OBD-II link
    pub fn connect_settings(&self) -> ConnectSettings {
        ConnectSettings {
            device: self.serial.port.clone(),
            baud_rate: self.serial.baud_rate,
            timeout: Duration::from_secs(self.serial.timeout_secs),
            max_attempts: self.serial.max_attempts,
        }
    }

    /// Broker configuration for the snapshot publisher
    pub fn publish_config(&self) -> PublishConfig {
        PublishConfig {
            broker_host: self.mqtt.broker.clone(),
            broker_port: self.mqtt.port,
            client_id: self.mqtt.client_id.clone(),
            username: self.mqtt.username.clone(),
            password: self.mqtt.password.clone(),
            topic_prefix: self.mqtt.topic_prefix.clone(),
            tls: self.mqtt.tls,
            timeout: Duration::from_secs(self.mqtt.publish_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let settings = Settings::load("does-not-exist").unwrap();
        assert_eq!(settings.serial.port, "/dev/ttyUSB0");
        assert_eq!(settings.serial.baud_rate, 38400);
        assert_eq!(settings.serial.max_attempts, 3);
        assert_eq!(settings.mqtt.broker, "localhost");
        assert_eq!(settings.mqtt.port, 1883);
        assert_eq!(settings.mqtt.username, None);
        assert!(!settings.mqtt.tls);
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn test_connect_settings_mapping() {
        let settings = Settings::load("does-not-exist").unwrap();
        let connect = settings.connect_settings();
        assert_eq!(connect.device, "/dev/ttyUSB0");
        assert_eq!(connect.timeout, Duration::from_secs(30));
        assert_eq!(connect.max_attempts, 3);
    }

    #[test]
    fn test_publish_config_mapping() {
        let settings = Settings::load("does-not-exist").unwrap();
        let publish = settings.publish_config();
        assert_eq!(publish.state_topic(), "car/battery/state");
        assert_eq!(publish.timeout, Duration::from_secs(10));
    }
}
