//! # Presenter Sink
//!
//! Optional rendering surface for live readings. The loop only ever pushes
//! formatted values into it; the one piece of control state flowing the
//! other way, a user-requested stop, travels over the shared
//! [`CancelSignal`](crate::clock::CancelSignal) instead, so the trait stays
//! a pure sink.

use crate::sample::ReadingText;

/// A sink receiving the formatted triple after every successful sample.
pub trait Presenter {
    /// Renders one reading. Must not block the loop.
    fn show(&mut self, reading: &ReadingText);
}

/// A presenter that discards every reading.
///
/// Stands in when no display surface is attached.
pub struct NoopPresenter;

impl Presenter for NoopPresenter {
    fn show(&mut self, _reading: &ReadingText) {}
}

/// Blanket implementation for mutable references to presenters.
impl<P: Presenter + ?Sized> Presenter for &mut P {
    fn show(&mut self, reading: &ReadingText) {
        (**self).show(reading)
    }
}
