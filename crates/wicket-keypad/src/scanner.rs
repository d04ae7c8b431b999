//! Matrix keypad scanner with debounce.
//!
//! The scanner consumes one [`ScanSample`] per poll tick and produces at
//! most one [`KeyEvent`] per physical press: a candidate key must stay
//! active for a configured number of consecutive samples before its
//! press is confirmed, and the matrix must read fully inactive before
//! the scanner re-arms. Contact bounce therefore never duplicates an
//! event and holding a key never repeat-fires.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, trace};

use wicket_core::{Edge, Error, KeyEvent, Result, Symbol};
use wicket_hardware::{LineSource, ScanSample};

/// Debounce progress for the current candidate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// No candidate; matrix read inactive last poll.
    Armed,

    /// A key went active and is accumulating stable samples.
    Settling { row: usize, col: usize, seen: u32 },

    /// A press was reported; waiting for the matrix to go inactive.
    Held { row: usize, col: usize },
}

/// Debounced matrix keypad scanner.
///
/// # Examples
///
/// ```
/// use wicket_hardware::mock::MockLineSource;
/// use wicket_keypad::KeyScanner;
/// use wicket_core::Symbol;
///
/// let mut lines = MockLineSource::new();
/// lines.press(0, 0, 3).release(1);
///
/// let mut scanner = KeyScanner::new(lines, 2);
/// let mut events = Vec::new();
/// for _ in 0..4 {
///     if let Some(event) = scanner.poll().unwrap() {
///         events.push(event);
///     }
/// }
///
/// let pressed: Vec<_> = events
///     .iter()
///     .filter(|e| e.edge == wicket_core::Edge::Pressed)
///     .collect();
/// assert_eq!(pressed.len(), 1);
/// assert_eq!(pressed[0].symbol, Symbol::Digit(1));
/// ```
#[derive(Debug)]
pub struct KeyScanner<L: LineSource> {
    lines: L,
    debounce_samples: u32,
    state: ScanState,
}

impl<L: LineSource> KeyScanner<L> {
    /// Create a scanner over a line source.
    ///
    /// `debounce_samples` is the number of consecutive active samples
    /// required to confirm a press; it is clamped to at least 1.
    pub fn new(lines: L, debounce_samples: u32) -> Self {
        Self {
            lines,
            debounce_samples: debounce_samples.max(1),
            state: ScanState::Armed,
        }
    }

    /// Take one sample and advance the debounce state machine.
    ///
    /// Returns at most one event per call: a `Pressed` event when a
    /// candidate key reaches the stable-sample threshold, a `Released`
    /// event when the matrix returns inactive after a confirmed press.
    ///
    /// # Errors
    ///
    /// Propagates a line-source fault as `Error::InputFault`. The
    /// scanner never synthesizes events past a fault.
    pub fn poll(&mut self) -> Result<Option<KeyEvent>> {
        let sample = self
            .lines
            .sample()
            .map_err(|e| Error::InputFault(e.to_string()))?;

        Ok(self.step(&sample))
    }

    fn step(&mut self, sample: &ScanSample) -> Option<KeyEvent> {
        match self.state {
            ScanState::Armed => {
                if let Some((row, col)) = sample.first_active() {
                    if self.debounce_samples == 1 {
                        return self.confirm(row, col);
                    }
                    self.state = ScanState::Settling { row, col, seen: 1 };
                }
                None
            }
            ScanState::Settling { row, col, seen } => {
                match sample.first_active() {
                    // Same candidate still active: one more stable sample.
                    Some((r, c)) if (r, c) == (row, col) => {
                        let seen = seen + 1;
                        if seen >= self.debounce_samples {
                            self.confirm(row, col)
                        } else {
                            self.state = ScanState::Settling { row, col, seen };
                            None
                        }
                    }
                    // A different key won the row-major scan: restart on it.
                    Some((r, c)) => {
                        trace!(from = ?(row, col), to = ?(r, c), "candidate changed mid-settle");
                        self.state = ScanState::Settling {
                            row: r,
                            col: c,
                            seen: 1,
                        };
                        None
                    }
                    // Bounce: the line dropped before confirmation.
                    None => {
                        self.state = ScanState::Armed;
                        None
                    }
                }
            }
            ScanState::Held { row, col } => {
                if sample.any_active() {
                    // Still held (or ghosting); no repeat fire.
                    None
                } else {
                    self.state = ScanState::Armed;
                    Symbol::at_position(row, col)
                        .ok()
                        .map(KeyEvent::released)
                }
            }
        }
    }

    fn confirm(&mut self, row: usize, col: usize) -> Option<KeyEvent> {
        self.state = ScanState::Held { row, col };
        match Symbol::at_position(row, col) {
            Ok(symbol) => {
                debug!(%symbol, row, col, "key press confirmed");
                Some(KeyEvent::pressed(symbol))
            }
            Err(_) => None,
        }
    }

    /// Drive the scanner on a fixed polling interval, forwarding events
    /// into a bounded channel with a single consumer.
    ///
    /// Returns `Ok(())` when the consumer goes away, `Err` on a line
    /// fault. Event handling downstream is synchronous in arrival
    /// order; a slow consumer delays the next poll tick but cannot
    /// corrupt scan state.
    ///
    /// # Errors
    ///
    /// Returns `Error::InputFault` when the line source becomes
    /// unreadable; scanning halts at that point.
    pub async fn run(mut self, interval: Duration, tx: mpsc::Sender<KeyEvent>) -> Result<()> {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match self.poll() {
                Ok(Some(event)) => {
                    if event.edge == Edge::Pressed && tx.send(event).await.is_err() {
                        debug!("key event consumer dropped, stopping scan loop");
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "line source unreadable, halting scanner");
                    return Err(e);
                }
            }
        }
    }
}
