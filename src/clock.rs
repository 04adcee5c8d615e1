//! # Sample Clock
//!
//! Governs the minimum inter-sample interval. The wait is cancellable: it
//! races the interval timer against the shared stop signal, so a
//! user-requested stop preempts a multi-second sleep immediately instead of
//! waiting the interval out.

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};

/// The stop signal shared between the control surface and the loop.
///
/// A signal stays latched once fired, so a stop requested mid-cycle is
/// observed at the next wait point at the latest.
pub type CancelSignal = Signal<CriticalSectionRawMutex, ()>;

/// How a wait concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitOutcome {
    /// The interval elapsed; the loop proceeds to the next cycle.
    Continue,
    /// The stop signal fired before the deadline.
    Cancelled,
}

/// Inter-sample wait discipline.
pub struct SampleClock {
    min_interval: Duration,
}

impl SampleClock {
    /// Creates a clock enforcing `min_interval` between samples.
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval }
    }

    /// Waits until the next cycle may start, or until cancelled.
    ///
    /// The deadline is computed at call time (`now + min_interval`); a
    /// signal that fired before the call returns `Cancelled` without
    /// sleeping at all.
    pub async fn wait_until_next(&self, cancel: &CancelSignal) -> WaitOutcome {
        let deadline = Instant::now() + self.min_interval;
        match select(Timer::at(deadline), cancel.wait()).await {
            Either::First(()) => WaitOutcome::Continue,
            Either::Second(()) => WaitOutcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn wait_runs_out_the_interval() {
        let clock = SampleClock::new(Duration::from_millis(30));
        let cancel = CancelSignal::new();
        let started = Instant::now();

        let outcome = block_on(clock.wait_until_next(&cancel));

        assert_eq!(outcome, WaitOutcome::Continue);
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn pre_fired_signal_cancels_without_sleeping() {
        let clock = SampleClock::new(Duration::from_secs(60));
        let cancel = CancelSignal::new();
        cancel.signal(());
        let started = Instant::now();

        let outcome = block_on(clock.wait_until_next(&cancel));

        assert_eq!(outcome, WaitOutcome::Cancelled);
        // Far inside the sub-second latency contract, nowhere near the
        // 60 s interval.
        assert!(started.elapsed() < Duration::from_millis(150));
    }
}
