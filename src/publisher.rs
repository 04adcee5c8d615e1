//! # Sample Publisher
//!
//! Serializes a [`Sample`] into the fixed telemetry payload and attempts a
//! single fire-and-forget delivery over a [`PublishLink`]: connect, publish
//! at QoS 0, disconnect. There is no retry and no queueing; a failed attempt
//! is logged with its full context and reported as non-fatal so the
//! acquisition loop proceeds to the next cycle regardless.
//!
//! When no channel is configured the publisher performs no I/O at all and
//! reports [`PublishOutcome::Skipped`].

use core::fmt::Write as _;

use heapless::String;
use log::{debug, warn};

use crate::config::PublishTarget;
use crate::error::{ConnectReasonCode, PublishError};
use crate::packet::{ConnAck, Connect, DecodePacket, Disconnect, EncodePacket, Publish};
use crate::sample::Sample;
use crate::transport::{LinkError, PublishLink};

/// Maximum length of the rendered field payload.
pub const MAX_PAYLOAD_LEN: usize = 64;

/// Scratch buffer for one encoded control packet.
const FRAME_BUF_LEN: usize = 256;

/// Keep-alive advertised in `CONNECT`. The session never outlives a single
/// publish, so the value only has to be non-zero and sane.
const KEEP_ALIVE_SECS: u16 = 60;

/// How a publish attempt concluded without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishOutcome {
    /// The sample was handed to the broker.
    Sent,
    /// No channel is configured; nothing was sent and nothing failed.
    Skipped,
}

/// Renders the fixed field mapping for one sample:
/// `field1=<CO2 integer>&field2=<temperature .2>&field3=<humidity .2>`.
pub fn payload_fields(sample: &Sample) -> String<MAX_PAYLOAD_LEN> {
    let mut payload = String::new();
    let _ = write!(
        payload,
        "field1={}&field2={:.2}&field3={:.2}",
        sample.co2_ppm, sample.temperature_c, sample.relative_humidity_pct
    );
    payload
}

/// One-shot MQTT publisher bound to a read-only [`PublishTarget`].
pub struct Publisher<'a> {
    target: &'a PublishTarget,
}

impl<'a> Publisher<'a> {
    /// Creates a publisher for the given target.
    pub fn new(target: &'a PublishTarget) -> Self {
        Self { target }
    }

    /// Attempts one delivery of `sample`.
    ///
    /// Opens the link, runs the CONNECT/PUBLISH/DISCONNECT exchange and
    /// closes the link again whether or not the exchange succeeded. The
    /// password is part of the CONNECT payload but never part of any log
    /// line.
    pub async fn publish<L>(
        &self,
        link: &mut L,
        sample: &Sample,
    ) -> Result<PublishOutcome, PublishError<L::Error>>
    where
        L: PublishLink,
        L::Error: LinkError,
    {
        if !self.target.is_configured() {
            debug!("publish skipped: no channel configured");
            return Ok(PublishOutcome::Skipped);
        }

        let payload = payload_fields(sample);
        let topic = self.target.topic();
        debug!(
            "writing payload '{}' to {}:{} topic '{}' client '{}' user '{}'",
            payload,
            self.target.host,
            self.target.port,
            topic,
            self.target.client_id,
            self.target.username,
        );

        let result = match link.open().await {
            Ok(()) => {
                let exchanged = self.exchange(link, &topic, payload.as_bytes()).await;
                link.close().await;
                exchanged
            }
            Err(e) => Err(PublishError::Link(e)),
        };

        match result {
            Ok(()) => Ok(PublishOutcome::Sent),
            Err(e) => {
                warn!(
                    "error while sending data to {}:{}: {:?} (payload '{}')",
                    self.target.host, self.target.port, e, payload,
                );
                Err(e)
            }
        }
    }

    /// The packet exchange on an open link.
    async fn exchange<L>(
        &self,
        link: &mut L,
        topic: &str,
        payload: &[u8],
    ) -> Result<(), PublishError<L::Error>>
    where
        L: PublishLink,
        L::Error: LinkError,
    {
        let mut frame = [0u8; FRAME_BUF_LEN];

        let mut connect = Connect::new(&self.target.client_id, KEEP_ALIVE_SECS, true);
        if !self.target.username.is_empty() {
            connect = connect.with_credentials(&self.target.username, &self.target.password);
        }
        let n = connect
            .encode(&mut frame)
            .map_err(PublishError::cast_link_error)?;
        link.send(&frame[..n]).await?;

        let n = link.recv(&mut frame).await?;
        let ack = ConnAck::decode(&frame[..n]).map_err(PublishError::cast_link_error)?;
        if ack.reason != ConnectReasonCode::Success {
            return Err(PublishError::ConnectionRefused(ack.reason));
        }

        let n = Publish { topic, payload }
            .encode(&mut frame)
            .map_err(PublishError::cast_link_error)?;
        link.send(&frame[..n]).await?;

        let n = Disconnect
            .encode(&mut frame)
            .map_err(PublishError::cast_link_error)?;
        link.send(&frame[..n]).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::vec::Vec;

    use futures::executor::block_on;
    use heapless::String;

    use super::*;
    use crate::config::TransportProtocol;

    #[derive(Debug)]
    struct ScriptError;
    impl LinkError for ScriptError {}

    /// Link double that records every frame and replays canned responses.
    #[derive(Default)]
    struct ScriptLink {
        opened: usize,
        closed: usize,
        sent: Vec<Vec<u8>>,
        responses: VecDeque<Vec<u8>>,
    }

    impl PublishLink for ScriptLink {
        type Error = ScriptError;

        async fn open(&mut self) -> Result<(), Self::Error> {
            self.opened += 1;
            Ok(())
        }

        async fn send(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
            self.sent.push(buf.to_vec());
            Ok(())
        }

        async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let response = self.responses.pop_front().ok_or(ScriptError)?;
            buf[..response.len()].copy_from_slice(&response);
            Ok(response.len())
        }

        async fn close(&mut self) {
            self.closed += 1;
        }
    }

    fn target() -> PublishTarget {
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

    fn sample() -> Sample {
        Sample::new(450, 22.5, 40.0)
    }

    #[test]
    fn payload_uses_fixed_field_mapping() {
        assert_eq!(
            payload_fields(&sample()).as_str(),
            "field1=450&field2=22.50&field3=40.00"
        );
    }

    #[test]
    fn unconfigured_channel_is_a_noop_success() {
        let target = PublishTarget::disabled();
        let publisher = Publisher::new(&target);
        let mut link = ScriptLink::default();

        let outcome = block_on(publisher.publish(&mut link, &sample())).unwrap();

        assert_eq!(outcome, PublishOutcome::Skipped);
        assert_eq!(link.opened, 0);
        assert!(link.sent.is_empty());
    }

    #[test]
    fn successful_publish_runs_full_exchange() {
        let target = target();
        let publisher = Publisher::new(&target);
        let mut link = ScriptLink::default();
        link.responses.push_back(vec![0x20, 0x02, 0x00, 0x00]);

        let outcome = block_on(publisher.publish(&mut link, &sample())).unwrap();

        assert_eq!(outcome, PublishOutcome::Sent);
        assert_eq!(link.opened, 1);
        assert_eq!(link.closed, 1);
        assert_eq!(link.sent.len(), 3);
        // CONNECT, then PUBLISH carrying topic and payload, then DISCONNECT.
        assert_eq!(link.sent[0][0], 0x10);
        assert_eq!(link.sent[1][0], 0x30);
        let publish_frame = &link.sent[1];
        let payload = b"field1=450&field2=22.50&field3=40.00";
        assert!(
            publish_frame
                .windows(payload.len())
                .any(|window| window == payload)
        );
        let topic = b"channels/1234567/publish";
        assert!(
            publish_frame
                .windows(topic.len())
                .any(|window| window == topic)
        );
        assert_eq!(link.sent[2], vec![0xE0, 0x00]);
    }

    #[test]
    fn refused_connection_reports_reason_and_closes_link() {
        let target = target();
        let publisher = Publisher::new(&target);
        let mut link = ScriptLink::default();
        link.responses.push_back(vec![0x20, 0x02, 0x00, 0x05]);

        let result = block_on(publisher.publish(&mut link, &sample()));

        assert!(matches!(
            result,
            Err(PublishError::ConnectionRefused(
                ConnectReasonCode::NotAuthorized
            ))
        ));
        // Only the CONNECT went out, and the link was still torn down.
        assert_eq!(link.sent.len(), 1);
        assert_eq!(link.closed, 1);
    }

    #[test]
    fn link_failure_is_surfaced_after_teardown() {
        let target = target();
        let publisher = Publisher::new(&target);
        // No canned CONNACK: recv fails like a silent broker.
        let mut link = ScriptLink::default();

        let result = block_on(publisher.publish(&mut link, &sample()));

        assert!(matches!(result, Err(PublishError::Link(ScriptError))));
        assert_eq!(link.closed, 1);
    }
}
