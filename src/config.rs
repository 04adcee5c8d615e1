//! # Station Configuration
//!
//! Validated, in-memory configuration for the acquisition loop. Reading the
//! persisted document (and any interactive editing of it) happens outside
//! this crate; what arrives here is the startup snapshot, constructed once
//! and passed by reference into the components that need it. A configuration
//! that fails [`StationConfig::validate`] is fatal at startup.

use core::fmt::Write;

use embassy_time::Duration;
use heapless::String;

use crate::error::ConfigError;

/// Maximum length of the telemetry channel identifier.
pub const MAX_CHANNEL_LEN: usize = 32;
/// Maximum length of the broker host name.
pub const MAX_HOST_LEN: usize = 64;
/// Maximum length of client id, username and password fields.
pub const MAX_CREDENTIAL_LEN: usize = 64;
/// Maximum length of a fully rendered publish topic.
pub const MAX_TOPIC_LEN: usize = 64;

/// Whether the loop runs one sample-publish cycle or keeps going until
/// cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunMode {
    /// Run exactly one cycle, then terminate with success.
    SingleShot,
    /// Run until the cancel signal fires.
    Continuous,
}

/// Transport the broker connection runs over.
///
/// The station itself only ships a TCP link; the variant is carried so the
/// firmware can pick the matching link implementation for its stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportProtocol {
    #[default]
    Tcp,
    WebSocket,
}

impl TransportProtocol {
    /// Parses the configuration vocabulary (`"tcp"`, `"websockets"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tcp" => Some(Self::Tcp),
            "websockets" => Some(Self::WebSocket),
            _ => None,
        }
    }
}

/// Where samples are delivered: broker coordinates, credentials and the
/// channel the topic is derived from.
///
/// An empty `channel_id` means publishing is disabled; the publisher then
/// skips the network entirely and reports success.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublishTarget {
    pub channel_id: String<MAX_CHANNEL_LEN>,
    pub host: String<MAX_HOST_LEN>,
    pub port: u16,
    pub client_id: String<MAX_CREDENTIAL_LEN>,
    pub username: String<MAX_CREDENTIAL_LEN>,
    pub password: String<MAX_CREDENTIAL_LEN>,
    pub transport: TransportProtocol,
}

impl PublishTarget {
    /// A target with no channel configured; publishing becomes a no-op.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether a channel is configured at all.
    pub fn is_configured(&self) -> bool {
        !self.channel_id.is_empty()
    }

    /// Renders the publish topic for the configured channel:
    /// `channels/<channel_id>/publish`.
    pub fn topic(&self) -> String<MAX_TOPIC_LEN> {
        let mut topic = String::new();
        // "channels/" + channel_id + "/publish" always fits MAX_TOPIC_LEN.
        let _ = write!(topic, "channels/{}/publish", self.channel_id);
        topic
    }
}

/// The startup snapshot governing the acquisition loop.
#[derive(Debug, Clone, PartialEq)]
pub struct StationConfig {
    /// Rate limit for the readiness poll while waiting for the sensor.
    pub poll_interval: Duration,
    /// Minimum wall-clock interval between two consecutive samples.
    pub sample_interval: Duration,
    /// How long discovery keeps rescanning an empty bus before failing.
    pub discovery_timeout: Duration,
    /// Single-shot or continuous operation.
    pub mode: RunMode,
    /// Where samples are published.
    pub target: PublishTarget,
}

impl StationConfig {
    /// Checks the invariants the loop relies on.
    ///
    /// Called once at startup; any error here is fatal by contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_interval.as_ticks() == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        if self.poll_interval.as_ticks() == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.discovery_timeout.as_ticks() == 0 {
            return Err(ConfigError::ZeroDiscoveryTimeout);
        }
        if self.target.is_configured() {
            if self.target.host.is_empty() {
                return Err(ConfigError::MissingHost);
            }
            if self.target.port == 0 {
                return Err(ConfigError::InvalidPort);
            }
            if self.target.client_id.is_empty() {
                return Err(ConfigError::MissingClientId);
            }
        }
        Ok(())
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            // The SCD30 cannot measure faster than once every two seconds.
            sample_interval: Duration::from_secs(2),
            discovery_timeout: Duration::from_secs(10),
            mode: RunMode::Continuous,
            target: PublishTarget::disabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured_target() -> PublishTarget {
        PublishTarget {
            channel_id: String::try_from("1234567").unwrap(),
            host: String::try_from("mqtt3.thingspeak.com").unwrap(),
            port: 1883,
            client_id: String::try_from("station-1").unwrap(),
            username: String::try_from("station-1").unwrap(),
            password: String::try_from("secret").unwrap(),
            transport: TransportProtocol::Tcp,
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(StationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn configured_target_is_valid() {
        let config = StationConfig {
            target: configured_target(),
            ..StationConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let mut config = StationConfig::default();
        config.sample_interval = Duration::from_ticks(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroSampleInterval));

        let mut config = StationConfig::default();
        config.poll_interval = Duration::from_ticks(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPollInterval));

        let mut config = StationConfig::default();
        config.discovery_timeout = Duration::from_ticks(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroDiscoveryTimeout));
    }

    #[test]
    fn configured_channel_requires_broker_coordinates() {
        let mut target = configured_target();
        target.host = String::new();
        let config = StationConfig {
            target,
            ..StationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingHost));

        let mut target = configured_target();
        target.port = 0;
        let config = StationConfig {
            target,
            ..StationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));

        let mut target = configured_target();
        target.client_id = String::new();
        let config = StationConfig {
            target,
            ..StationConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingClientId));
    }

    #[test]
    fn disabled_target_skips_broker_checks() {
        let config = StationConfig {
            target: PublishTarget::disabled(),
            ..StationConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn topic_follows_channel_scheme() {
        let target = configured_target();
        assert_eq!(target.topic().as_str(), "channels/1234567/publish");
    }

    #[test]
    fn transport_names_parse() {
        assert_eq!(
            TransportProtocol::from_name("tcp"),
            Some(TransportProtocol::Tcp)
        );
        assert_eq!(
            TransportProtocol::from_name("websockets"),
            Some(TransportProtocol::WebSocket)
        );
        assert_eq!(TransportProtocol::from_name("udp"), None);
    }
}
