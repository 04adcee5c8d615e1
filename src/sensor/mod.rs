//! # Sensor Capability Interface
//!
//! The acquisition loop never talks to hardware directly; it is polymorphic
//! over any driver exposing the two capabilities it needs: a cheap
//! readiness check and a full measurement read. The concrete SCD30
//! implementation lives in [`scd30`]; tests drive the loop with scripted
//! doubles.

pub mod scd30;

pub use scd30::{Scd30, Scd30Error};

use crate::sample::Sample;

/// The read surface of a CO2/temperature/humidity sensor.
///
/// `read` is only invoked after `data_ready` reported `true` and yields a
/// complete, internally consistent triple for one physical measurement
/// event, never partial data. A driver error during `read` fails the
/// surrounding iteration only; the loop logs it and carries on.
#[allow(async_fn_in_trait)]
pub trait SensorDriver {
    /// The error type returned by the driver.
    type Error: core::fmt::Debug;

    /// Whether a new measurement is available to be read.
    ///
    /// Polled on every loop iteration; implementations should keep this to
    /// a single short bus transaction.
    async fn data_ready(&mut self) -> Result<bool, Self::Error>;

    /// Reads one complete measurement.
    async fn read(&mut self) -> Result<Sample, Self::Error>;
}

/// Blanket implementation for mutable references.
///
/// This allows handing the loop a `&mut` driver while the caller keeps
/// ownership (the test doubles rely on it).
impl<S: SensorDriver + ?Sized> SensorDriver for &mut S {
    type Error = S::Error;

    async fn data_ready(&mut self) -> Result<bool, Self::Error> {
        (**self).data_ready().await
    }

    async fn read(&mut self) -> Result<Sample, Self::Error> {
        (**self).read().await
    }
}
