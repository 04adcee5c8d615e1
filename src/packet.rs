//! # MQTT Packet Structures and Serialization
//!
//! The four control packets a fire-and-forget publish needs (`CONNECT`,
//! `CONNACK`, `PUBLISH` and `DISCONNECT`) with traits for encoding and
//! decoding them to and from a byte buffer. The station only ever speaks
//! MQTT 3.1.1 and only ever publishes at QoS 0, so nothing else exists here.

use crate::error::{ConnectReasonCode, ErrorPlaceHolder, ProtocolError, PublishError};
use crate::util::{self, write_utf8_string};

/// A trait for packets that can be encoded into a byte buffer.
pub trait EncodePacket {
    fn encode(&self, buf: &mut [u8]) -> Result<usize, PublishError<ErrorPlaceHolder>>;
}

/// A trait for packets that can be decoded from a byte buffer.
pub trait DecodePacket<'a>: Sized {
    fn decode(buf: &'a [u8]) -> Result<Self, PublishError<ErrorPlaceHolder>>;
}

// --- CONNECT Packet ---

/// The `CONNECT` packet opening the broker session.
///
/// Username/password flags are set whenever credentials are present; the
/// telemetry brokers the station targets require both.
#[derive(Debug)]
pub struct Connect<'a> {
    pub clean_session: bool,
    pub keep_alive: u16,
    pub client_id: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

impl<'a> Connect<'a> {
    pub fn new(client_id: &'a str, keep_alive: u16, clean_session: bool) -> Self {
        Self {
            client_id,
            keep_alive,
            clean_session,
            username: None,
            password: None,
        }
    }

    /// Attaches username/password credentials to the session.
    pub fn with_credentials(mut self, username: &'a str, password: &'a str) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }
}

impl<'a> EncodePacket for Connect<'a> {
    fn encode(&self, buf: &mut [u8]) -> Result<usize, PublishError<ErrorPlaceHolder>> {
        let mut cursor = 0;
        buf[cursor] = 0x10;
        cursor += 1;
        // Reserve space for the remaining length (max 4 bytes), compacted
        // below once the content size is known.
        let remaining_len_pos = cursor;
        cursor += 4;
        let content_start = cursor;

        cursor += write_utf8_string(&mut buf[cursor..], "MQTT")?;
        // Protocol level 4 = MQTT 3.1.1.
        buf[cursor] = 4;
        cursor += 1;

        let mut flags = 0;
        if self.clean_session {
            flags |= 0x02;
        }
        if self.username.is_some() {
            flags |= 0x80;
        }
        if self.password.is_some() {
            flags |= 0x40;
        }
        buf[cursor] = flags;
        cursor += 1;

        buf[cursor..cursor + 2].copy_from_slice(&self.keep_alive.to_be_bytes());
        cursor += 2;

        cursor += write_utf8_string(&mut buf[cursor..], self.client_id)?;
        if let Some(username) = self.username {
            cursor += write_utf8_string(&mut buf[cursor..], username)?;
        }
        if let Some(password) = self.password {
            cursor += write_utf8_string(&mut buf[cursor..], password)?;
        }

        let remaining_len = cursor - content_start;
        let len_bytes =
            util::write_variable_byte_integer(&mut buf[remaining_len_pos..], remaining_len)?;
        let header_len = 1 + len_bytes;
        buf.copy_within(content_start..cursor, header_len);
        Ok(header_len + remaining_len)
    }
}

// --- CONNACK Packet ---

/// The broker's answer to `CONNECT`.
#[derive(Debug)]
pub struct ConnAck {
    pub session_present: bool,
    pub reason: ConnectReasonCode,
}

impl<'a> DecodePacket<'a> for ConnAck {
    fn decode(buf: &'a [u8]) -> Result<Self, PublishError<ErrorPlaceHolder>> {
        let header = *buf
            .get(0)
            .ok_or(PublishError::Protocol(ProtocolError::MalformedPacket))?;
        if header >> 4 != 2 {
            return Err(PublishError::Protocol(ProtocolError::InvalidResponse));
        }
        // Fixed 2-byte variable header in 3.1.1: ack flags + reason code.
        let remaining_len = *buf
            .get(1)
            .ok_or(PublishError::Protocol(ProtocolError::MalformedPacket))?;
        if remaining_len < 2 || buf.len() < 4 {
            return Err(PublishError::Protocol(ProtocolError::MalformedPacket));
        }
        Ok(Self {
            session_present: (buf[2] & 0x01) != 0,
            reason: ConnectReasonCode::from(buf[3]),
        })
    }
}

// --- PUBLISH Packet ---

/// An outbound `PUBLISH` at QoS 0.
///
/// Fire-and-forget delivery never carries a packet id, so none is modeled.
#[derive(Debug)]
pub struct Publish<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
}

impl<'a> EncodePacket for Publish<'a> {
    fn encode(&self, buf: &mut [u8]) -> Result<usize, PublishError<ErrorPlaceHolder>> {
        let mut cursor = 0;

        // Fixed header: PUBLISH packet type (3), QoS 0 flags.
        buf[cursor] = 0x30;
        cursor += 1;

        let remaining_len_pos = cursor;
        cursor += 4;
        let content_start = cursor;

        cursor += write_utf8_string(&mut buf[cursor..], self.topic)?;

        if cursor + self.payload.len() > buf.len() {
            return Err(PublishError::BufferTooSmall);
        }
        buf[cursor..cursor + self.payload.len()].copy_from_slice(self.payload);
        cursor += self.payload.len();

        let remaining_len = cursor - content_start;
        let len_bytes =
            util::write_variable_byte_integer(&mut buf[remaining_len_pos..], remaining_len)?;
        let header_len = 1 + len_bytes;
        buf.copy_within(content_start..cursor, header_len);

        Ok(header_len + remaining_len)
    }
}

// --- DISCONNECT Packet ---

/// The clean session teardown sent after every publish attempt.
#[derive(Debug)]
pub struct Disconnect;

impl EncodePacket for Disconnect {
    fn encode(&self, buf: &mut [u8]) -> Result<usize, PublishError<ErrorPlaceHolder>> {
        if buf.len() < 2 {
            return Err(PublishError::BufferTooSmall);
        }
        buf[0] = 0xE0;
        buf[1] = 0x00;
        Ok(2)
    }
}
