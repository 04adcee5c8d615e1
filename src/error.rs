//! # Error Types
//!
//! This module defines the error types used throughout the station crate,
//! split along the failure taxonomy the acquisition loop relies on: fatal
//! startup errors (configuration, discovery) and per-cycle publish errors
//! that are contained within the iteration that produced them.

use crate::transport;

/// A placeholder error type used in generic contexts where the specific link
/// error is not yet known. This is a common pattern for implementing `encode`
/// methods that need to return a `Result` compatible with the publisher's
/// error type.
#[derive(Debug)]
pub struct ErrorPlaceHolder;

impl transport::LinkError for ErrorPlaceHolder {
    // This is a marker implementation and doesn't need a body.
}

/// Fatal configuration error, detected by [`StationConfig::validate`].
///
/// Any of these terminates startup; the loop is never entered with a
/// configuration that failed validation.
///
/// [`StationConfig::validate`]: crate::config::StationConfig::validate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The minimum inter-sample interval is zero.
    ZeroSampleInterval,
    /// The readiness poll interval is zero.
    ZeroPollInterval,
    /// The bus discovery timeout is zero.
    ZeroDiscoveryTimeout,
    /// A channel is configured but the broker host is empty.
    MissingHost,
    /// A channel is configured but the broker port is zero.
    InvalidPort,
    /// A channel is configured but the MQTT client id is empty.
    MissingClientId,
}

/// Fatal bus discovery error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanError {
    /// No device answered on the bus before the configured deadline.
    DiscoveryTimeout,
}

/// The primary error enum for the publish path.
///
/// It is generic over the link error type `T`, allowing it to wrap specific
/// errors from the underlying network link (e.g. TCP). Publish errors are
/// non-fatal by contract: the acquisition loop logs them and proceeds to the
/// next cycle.
#[derive(Debug)]
pub enum PublishError<T> {
    /// An error occurred in the underlying link layer.
    Link(T),
    /// A protocol-level error occurred, indicating a violation of the MQTT
    /// specification.
    Protocol(ProtocolError),
    /// The connection was refused by the broker. The enclosed code provides
    /// the reason.
    ConnectionRefused(ConnectReasonCode),
    /// The buffer provided for an operation was too small.
    BufferTooSmall,
}

/// Implements the `From` trait to allow for automatic conversion of any link
/// error into a `PublishError`. This is what allows the `?` operator to work
/// seamlessly on `Result`s from the link layer.
impl<T: transport::LinkError> From<T> for PublishError<T> {
    fn from(err: T) -> Self {
        PublishError::Link(err)
    }
}

impl<T: transport::LinkError> PublishError<T> {
    /// A helper method to convert a `PublishError` with a placeholder link
    /// error into a `PublishError` with a specific link error type `T`.
    ///
    /// This is used to bridge the gap between generic packet encoding
    /// functions and the specific error type required by the publisher's
    /// `Result`.
    pub fn cast_link_error<E: transport::LinkError>(other: PublishError<E>) -> PublishError<T> {
        match other {
            PublishError::Protocol(p) => PublishError::Protocol(p),
            PublishError::ConnectionRefused(c) => PublishError::ConnectionRefused(c),
            PublishError::BufferTooSmall => PublishError::BufferTooSmall,
            // The link variant can't be cast, as we don't know the concrete
            // type `E`. This method is designed for errors originating from
            // packet logic, which should not produce link errors directly.
            PublishError::Link(_) => panic!("Cannot cast a link error"),
        }
    }
}

/// Represents the reason codes for a connection refusal (`CONNACK`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ConnectReasonCode {
    /// The connection was accepted.
    Success = 0,
    /// The broker does not support the requested MQTT protocol version.
    UnacceptableProtocolVersion = 1,
    /// The client identifier is not valid.
    IdentifierRejected = 2,
    /// The broker is unavailable.
    ServerUnavailable = 3,
    /// The username or password is not valid.
    BadUserNameOrPassword = 4,
    /// The client is not authorized to connect.
    NotAuthorized = 5,
    /// An unknown or unspecified error occurred.
    Other(u8),
}

impl From<u8> for ConnectReasonCode {
    fn from(val: u8) -> Self {
        match val {
            0 => Self::Success,
            1 => Self::UnacceptableProtocolVersion,
            2 => Self::IdentifierRejected,
            3 => Self::ServerUnavailable,
            4 => Self::BadUserNameOrPassword,
            5 => Self::NotAuthorized,
            _ => Self::Other(val),
        }
    }
}

/// Enumerates specific MQTT protocol errors on the publish path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// The broker sent an invalid or unexpected response.
    InvalidResponse,
    /// The connection was closed by the broker.
    ConnectionClosed,
    /// A packet was received that was not correctly formed.
    MalformedPacket,
    /// The payload of a message exceeds the maximum allowable size.
    PayloadTooLarge,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connack_reason_codes_map_from_wire_values() {
        assert_eq!(ConnectReasonCode::from(0), ConnectReasonCode::Success);
        assert_eq!(ConnectReasonCode::from(5), ConnectReasonCode::NotAuthorized);
        assert_eq!(ConnectReasonCode::from(42), ConnectReasonCode::Other(42));
    }
}
