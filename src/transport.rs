//! # Publish Link Abstraction
//!
//! This module defines the [`PublishLink`] trait, which abstracts the
//! connection a publish attempt runs over (TCP here, but any reliable
//! ordered byte stream works), keeping the publisher hardware and
//! network-stack agnostic.
//!
//! Unlike a long-lived client connection, a link is opened for a single
//! delivery attempt and closed right after it, mirroring the station's
//! fire-and-forget publish discipline.

use embassy_net::IpEndpoint;
use embassy_net::tcp::{ConnectError, Error as TcpError, TcpSocket};
use embassy_time::{Duration, Timer};
use embedded_io_async::Write;

/// A marker trait for link-related errors.
pub trait LinkError: core::fmt::Debug {}

/// A transport carrying one publish attempt.
#[allow(async_fn_in_trait)]
pub trait PublishLink {
    /// The error type returned by the link.
    type Error: core::fmt::Debug;

    /// Establishes the connection for one delivery attempt.
    async fn open(&mut self) -> Result<(), Self::Error>;

    /// Sends a buffer of data over the link.
    async fn send(&mut self, buf: &[u8]) -> Result<(), Self::Error>;

    /// Receives data from the link into a buffer.
    ///
    /// Returns the number of bytes read. Implementations must bound the wait
    /// so an unresponsive broker cannot stall the sampling cadence.
    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Tears the connection down. Best-effort; errors are swallowed because
    /// the attempt is already over.
    async fn close(&mut self);
}

/// Blanket implementation for mutable references to links.
impl<L: PublishLink + ?Sized> PublishLink for &mut L {
    type Error = L::Error;

    async fn open(&mut self) -> Result<(), Self::Error> {
        (**self).open().await
    }

    async fn send(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        (**self).send(buf).await
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        (**self).recv(buf).await
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}

/// Errors produced by [`TcpLink`].
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TcpLinkError {
    /// The TCP connection could not be established.
    Connect(ConnectError),
    /// A read or write on the established connection failed.
    Io(TcpError),
    /// The peer closed the connection mid-exchange.
    Closed,
    /// No response arrived within the link timeout.
    Timeout,
}

impl LinkError for TcpLinkError {}

/// TCP link implementation using `embassy-net`.
///
/// The endpoint must already be resolved; name lookup is the firmware's
/// concern.
pub struct TcpLink<'a> {
    socket: TcpSocket<'a>,
    endpoint: IpEndpoint,
    timeout: Duration,
}

impl<'a> TcpLink<'a> {
    /// Creates a new `TcpLink` over the given socket, connecting to
    /// `endpoint` with `timeout` bounding each receive.
    pub fn new(socket: TcpSocket<'a>, endpoint: IpEndpoint, timeout: Duration) -> Self {
        Self {
            socket,
            endpoint,
            timeout,
        }
    }

    /// A helper function to perform a read with a timeout.
    async fn read_with_timeout(&mut self, buf: &mut [u8]) -> Result<usize, TcpLinkError> {
        // Use `select` to race the read operation against a timer.
        let read_fut = self.socket.read(buf);
        let timer = Timer::after(self.timeout);

        match futures::future::select(core::pin::pin!(read_fut), core::pin::pin!(timer)).await {
            futures::future::Either::Left((Ok(n), _)) => {
                if n == 0 {
                    // If the peer closes the connection, read returns 0.
                    Err(TcpLinkError::Closed)
                } else {
                    Ok(n)
                }
            }
            futures::future::Either::Left((Err(e), _)) => Err(TcpLinkError::Io(e)),
            futures::future::Either::Right(((), _)) => Err(TcpLinkError::Timeout),
        }
    }
}

impl<'a> PublishLink for TcpLink<'a> {
    type Error = TcpLinkError;

    async fn open(&mut self) -> Result<(), Self::Error> {
        self.socket
            .connect(self.endpoint)
            .await
            .map_err(TcpLinkError::Connect)
    }

    async fn send(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.socket
            .write_all(buf)
            .await
            .map_err(TcpLinkError::Io)?;

        // Flush to ensure data is actually sent to the network
        self.socket.flush().await.map_err(TcpLinkError::Io)
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.read_with_timeout(buf).await
    }

    async fn close(&mut self) {
        self.socket.close();
        let _ = self.socket.flush().await;
        self.socket.abort();
    }
}
