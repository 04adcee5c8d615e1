//! # CO2 Environmental Station Core
//!
//! `co2-station` is a `no_std` compatible acquisition-and-publish loop for a
//! CO2/temperature/humidity sensor, built upon the
//! [Embassy](https://embassy.dev/) async ecosystem.
//!
//! ## Core Features
//!
//! - **`no_std` & `no_alloc`:** Designed to run on bare-metal
//!   microcontrollers without requiring a standard library or dynamic memory
//!   allocation. Buffers are managed using `heapless`.
//! - **Fully Async:** Built with `async/await` and leverages the Embassy
//!   ecosystem for timers and networking, ensuring non-blocking operations.
//! - **Hardware Agnostic:** The sensor is reached through the
//!   [`SensorDriver`] capability trait (an SCD30 implementation ships in
//!   [`sensor::scd30`]); the broker is reached through the [`PublishLink`]
//!   trait with a TCP implementation over `embassy-net`.
//! - **Failure Containment:** A failed read skips its cycle, a failed
//!   publish is logged and ignored; neither ever escapes the iteration that
//!   produced it.
//! - **Cancellable Waits:** The inter-sample wait races the interval timer
//!   against a shared stop signal, so cancellation preempts a multi-second
//!   sleep immediately.
//!
//! ## Architecture
//!
//! Startup runs bus discovery once, then assembles the [`Station`] from the
//! validated configuration and its collaborators:
//!
//! ```ignore
//! let addresses = scanner::discover(&mut i2c, config.discovery_timeout).await?;
//! let mut sensor = Scd30::with_address(i2c, addresses[0]);
//! sensor.start_continuous(2, 0).await?;
//!
//! static CANCEL: CancelSignal = CancelSignal::new();
//! let mut station = Station::new(&config, sensor, link, NoopPresenter, &CANCEL);
//! match station.run().await {
//!     RunOutcome::Completed | RunOutcome::Cancelled => { /* clean exit */ }
//! }
//! ```
//!
//! Each cycle polls readiness at the configured rate, reads exactly one
//! sample per readiness, publishes it fire-and-forget (skipped entirely when
//! no channel is configured) and hands the formatted reading to the
//! [`Presenter`]. Single-shot mode terminates after one cycle; continuous
//! mode keeps the minimum inter-sample interval until cancelled.

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod config;
pub mod error;
pub mod packet;
pub mod presenter;
pub mod publisher;
pub mod sample;
pub mod scanner;
pub mod sensor;
pub mod station;
pub mod transport;
pub mod util;

// Re-export key types for easier access at the crate root.
pub use clock::{CancelSignal, SampleClock, WaitOutcome};
pub use config::{PublishTarget, RunMode, StationConfig, TransportProtocol};
pub use error::{ConfigError, PublishError, ScanError};
pub use presenter::{NoopPresenter, Presenter};
pub use publisher::{PublishOutcome, Publisher};
pub use sample::{ReadingText, Sample};
pub use sensor::{Scd30, SensorDriver};
pub use station::{RunOutcome, Station};
pub use transport::{PublishLink, TcpLink};
