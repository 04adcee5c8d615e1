//! # Acquisition Loop
//!
//! The one stateful control component: polls the sensor for readiness at a
//! rate-limited cadence, reads exactly one sample per readiness, hands it to
//! the publisher and the presenter, then either terminates (single-shot) or
//! waits out the sample clock while staying responsive to cancellation.
//!
//! Failure containment is the loop's main contract: a failed read skips the
//! cycle, a failed publish is logged and ignored, and neither ever carries
//! state into the next iteration.

use embassy_time::Timer;
use log::{info, warn};

use crate::clock::{CancelSignal, SampleClock, WaitOutcome};
use crate::config::{RunMode, StationConfig};
use crate::presenter::Presenter;
use crate::publisher::Publisher;
use crate::sensor::SensorDriver;
use crate::transport::{LinkError, PublishLink};

/// How a run terminated. Both variants map to a successful process exit;
/// fatal startup errors (configuration, discovery) never reach the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunOutcome {
    /// Single-shot mode finished its one cycle.
    Completed,
    /// The stop signal fired.
    Cancelled,
}

/// The assembled station: configuration plus every collaborator, constructed
/// once at startup and never reached through ambient globals.
pub struct Station<'a, S, L, P> {
    config: &'a StationConfig,
    sensor: S,
    link: L,
    presenter: P,
    publisher: Publisher<'a>,
    clock: SampleClock,
    cancel: &'a CancelSignal,
}

impl<'a, S, L, P> Station<'a, S, L, P>
where
    S: SensorDriver,
    L: PublishLink,
    L::Error: LinkError,
    P: Presenter,
{
    /// Wires the loop up. `config` must already have passed
    /// [`validate`](StationConfig::validate); discovery has already produced
    /// the sensor by the time a station exists.
    pub fn new(
        config: &'a StationConfig,
        sensor: S,
        link: L,
        presenter: P,
        cancel: &'a CancelSignal,
    ) -> Self {
        Self {
            config,
            sensor,
            link,
            presenter,
            publisher: Publisher::new(&config.target),
            clock: SampleClock::new(config.sample_interval),
            cancel,
        }
    }

    /// Runs the steady-state cycle until termination.
    pub async fn run(&mut self) -> RunOutcome {
        loop {
            match self.sensor.data_ready().await {
                Ok(true) => {}
                Ok(false) => {
                    Timer::after(self.config.poll_interval).await;
                    continue;
                }
                Err(e) => {
                    warn!("readiness check failed: {:?}", e);
                    Timer::after(self.config.poll_interval).await;
                    continue;
                }
            }

            let sample = match self.sensor.read().await {
                Ok(sample) => sample,
                Err(e) => {
                    warn!("sensor read failed, skipping cycle: {:?}", e);
                    continue;
                }
            };
            info!(
                "CO2: {} PPM; Temperature: {:.2} ºC; Humidity: {:.2} % RH",
                sample.co2_ppm, sample.temperature_c, sample.relative_humidity_pct
            );

            // Failures are contained and already logged with their context
            // by the publisher.
            let _ = self.publisher.publish(&mut self.link, &sample).await;

            self.presenter.show(&sample.reading_text());

            if self.config.mode == RunMode::SingleShot {
                return RunOutcome::Completed;
            }

            match self.clock.wait_until_next(self.cancel).await {
                WaitOutcome::Continue => {}
                WaitOutcome::Cancelled => {
                    info!("stop requested, terminating");
                    return RunOutcome::Cancelled;
                }
            }
        }
    }
}
