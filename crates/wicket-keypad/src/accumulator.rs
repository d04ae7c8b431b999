//! PIN assembly state machine.
//!
//! The accumulator folds debounced key presses into a bounded digit
//! buffer and reports exactly three things upward: a complete
//! submission, an explicit short-submit rejection (when the deployment
//! opts in), or a cancellation. It never hands out a PIN whose length
//! differs from the configured one.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use wicket_core::{ControllerConfig, ReservedKey, Symbol};

/// Observable accumulator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    /// No digits buffered.
    Empty,

    /// Between one and N-1 digits buffered.
    Filling,

    /// Exactly N digits buffered; awaiting submit.
    Ready,
}

/// What a key press resolved to, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinEvent {
    /// A complete PIN was submitted. Length always equals the
    /// configured PIN length.
    Submitted(String),

    /// Submit arrived on an incomplete buffer and the deployment
    /// treats that as an explicit malformed entry. Carries the partial
    /// digits for the audit record.
    ShortSubmit { entered: String },

    /// The bound cancel key was pressed; any in-flight verification
    /// cycle should be abandoned.
    Cancelled,
}

/// Fixed-length PIN accumulator.
///
/// # Examples
///
/// ```
/// use std::time::Instant;
/// use wicket_core::{ControllerConfig, Symbol};
/// use wicket_keypad::{PinAccumulator, PinEvent};
///
/// let config = ControllerConfig::default();
/// let mut acc = PinAccumulator::new(&config);
/// let now = Instant::now();
///
/// for d in [1, 2, 3, 4] {
///     assert_eq!(acc.apply(Symbol::Digit(d), now), None);
/// }
/// let event = acc.apply(Symbol::Submit, now);
/// assert_eq!(event, Some(PinEvent::Submitted("1234".into())));
/// ```
#[derive(Debug)]
pub struct PinAccumulator {
    buffer: String,
    pin_length: usize,
    idle_timeout: Duration,
    reject_short_submit: bool,
    cancel_key: Option<ReservedKey>,
    last_activity: Option<Instant>,
}

impl PinAccumulator {
    /// Create an accumulator from controller configuration.
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            buffer: String::with_capacity(config.pin_length),
            pin_length: config.pin_length,
            idle_timeout: config.pin_idle_timeout(),
            reject_short_submit: config.submit_short_pin_rejects,
            cancel_key: config.cancel_key,
            last_activity: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AccumulatorState {
        match self.buffer.len() {
            0 => AccumulatorState::Empty,
            n if n < self.pin_length => AccumulatorState::Filling,
            _ => AccumulatorState::Ready,
        }
    }

    /// Number of digits currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard a partial entry that has sat idle past the timeout.
    ///
    /// Returns `true` if a stale entry was discarded. The pipeline
    /// calls this from its timer tick so a stale partial PIN cannot
    /// leak into a later session.
    pub fn expire_if_idle(&mut self, now: Instant) -> bool {
        let stale = self.last_activity.is_some_and(|at| {
            !self.buffer.is_empty() && now.duration_since(at) >= self.idle_timeout
        });
        if stale {
            debug!(buffered = self.buffer.len(), "partial PIN expired");
            self.reset();
        }
        stale
    }

    /// Feed one key press into the state machine.
    ///
    /// Only `Pressed` symbols should be fed; the caller filters edges.
    /// `now` drives the idle timeout and is injectable for tests.
    pub fn apply(&mut self, symbol: Symbol, now: Instant) -> Option<PinEvent> {
        self.expire_if_idle(now);

        match symbol {
            Symbol::Digit(d) => {
                // The buffer is bounded at N; surplus digits are inert
                // until the user submits or clears.
                if self.buffer.len() < self.pin_length {
                    self.buffer.push(char::from(b'0' + d));
                    self.last_activity = Some(now);
                    trace!(buffered = self.buffer.len(), "digit accepted");
                }
                None
            }
            Symbol::Clear => {
                if !self.buffer.is_empty() {
                    debug!(discarded = self.buffer.len(), "entry cleared");
                }
                self.reset();
                None
            }
            Symbol::Submit => self.submit(),
            Symbol::Reserved(key) => {
                if self.cancel_key == Some(key) {
                    debug!(%key, "cancel key pressed");
                    self.reset();
                    Some(PinEvent::Cancelled)
                } else {
                    // Unbound reserved keys are semantically inert.
                    None
                }
            }
        }
    }

    fn submit(&mut self) -> Option<PinEvent> {
        match self.state() {
            AccumulatorState::Ready => {
                let pin = std::mem::take(&mut self.buffer);
                self.last_activity = None;
                debug_assert_eq!(pin.len(), self.pin_length);
                Some(PinEvent::Submitted(pin))
            }
            AccumulatorState::Empty | AccumulatorState::Filling if self.reject_short_submit => {
                let entered = std::mem::take(&mut self.buffer);
                self.last_activity = None;
                Some(PinEvent::ShortSubmit { entered })
            }
            // Default policy: submit on an incomplete buffer is a no-op
            // and the user keeps typing.
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.last_activity = None;
    }
}
