//! Access cycle state machine.
//!
//! One access attempt moves through a fixed set of phases:
//!
//! - `AwaitingPin`: collecting digits, no attempt in flight
//! - `PinSubmitted`: a complete PIN arrived, directory lookup pending
//! - `VerifyingFace`: face verification in progress
//! - `Decided`: the decision exists and is being recorded
//!
//! # Valid Transitions
//!
//! - AwaitingPin → PinSubmitted → VerifyingFace → Decided → AwaitingPin
//! - PinSubmitted → Decided (lookup miss, malformed PIN, or face
//!   verification disabled)
//!
//! Every other transition is rejected, so a grant can never be reached
//! without passing through the decision phase.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use wicket_core::{Error, Result};

/// Maximum number of transitions retained for diagnostics.
///
/// A full cycle is four transitions, so this holds the last sixteen
/// access attempts.
const MAX_HISTORY_SIZE: usize = 64;

/// Phase of the current access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    /// Collecting digits; no attempt in flight.
    AwaitingPin,

    /// A complete PIN was submitted; directory lookup pending.
    PinSubmitted,

    /// Face verification in progress for a matched user.
    VerifyingFace,

    /// The decision exists and is being recorded.
    Decided,
}

impl fmt::Display for AccessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            AccessState::AwaitingPin => "AwaitingPin",
            AccessState::PinSubmitted => "PinSubmitted",
            AccessState::VerifyingFace => "VerifyingFace",
            AccessState::Decided => "Decided",
        };
        write!(f, "{state_str}")
    }
}

impl AccessState {
    /// Check if transition to the target state is valid from this one.
    ///
    /// # Examples
    ///
    /// ```
    /// use wicket_engine::AccessState;
    ///
    /// assert!(AccessState::AwaitingPin.can_transition_to(&AccessState::PinSubmitted));
    /// assert!(!AccessState::AwaitingPin.can_transition_to(&AccessState::Decided));
    /// ```
    pub fn can_transition_to(&self, target: &AccessState) -> bool {
        matches!(
            (self, target),
            (AccessState::AwaitingPin, AccessState::PinSubmitted)
                // Lookup miss, malformed PIN, or verification disabled
                // skip the face phase.
                | (AccessState::PinSubmitted, AccessState::VerifyingFace | AccessState::Decided)
                | (AccessState::VerifyingFace, AccessState::Decided)
                | (AccessState::Decided, AccessState::AwaitingPin)
        )
    }
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleTransition {
    /// The state transitioned from.
    pub from: AccessState,

    /// The state transitioned to.
    pub to: AccessState,

    /// When the transition occurred. Not serialized; restored to the
    /// deserialization time since `Instant` is process-specific.
    #[serde(skip, default = "Instant::now")]
    pub at: Instant,
}

impl CycleTransition {
    fn new(from: AccessState, to: AccessState) -> Self {
        Self {
            from,
            to,
            at: Instant::now(),
        }
    }

    /// Time elapsed since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.at.elapsed()
    }
}

/// Validated state machine for the access cycle.
///
/// Not thread-safe by design; the engine owns one per device and
/// drives it from a single task.
///
/// # Examples
///
/// ```
/// use wicket_engine::{AccessCycle, AccessState};
///
/// let mut cycle = AccessCycle::new();
/// cycle.transition_to(AccessState::PinSubmitted).unwrap();
/// cycle.transition_to(AccessState::Decided).unwrap();
/// cycle.transition_to(AccessState::AwaitingPin).unwrap();
/// assert_eq!(cycle.history().len(), 3);
/// ```
pub struct AccessCycle {
    current_state: AccessState,
    state_entered_at: Instant,
    history: VecDeque<CycleTransition>,
}

impl AccessCycle {
    /// Create a cycle in the `AwaitingPin` state.
    pub fn new() -> Self {
        Self {
            current_state: AccessState::AwaitingPin,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Current phase of the cycle.
    pub fn current_state(&self) -> &AccessState {
        &self.current_state
    }

    /// Time spent in the current phase.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<CycleTransition> {
        &self.history
    }

    /// Transition to a new phase, validating the move.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] if the move is not
    /// allowed from the current phase. The cycle is left unchanged.
    pub fn transition_to(&mut self, new_state: AccessState) -> Result<CycleTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = CycleTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition.clone());
        Ok(transition)
    }

    /// Force the cycle back to `AwaitingPin` for error recovery.
    pub fn reset(&mut self) -> CycleTransition {
        let transition = CycleTransition::new(self.current_state, AccessState::AwaitingPin);
        self.perform_state_change(AccessState::AwaitingPin, transition.clone());
        transition
    }

    fn perform_state_change(&mut self, new_state: AccessState, transition: CycleTransition) {
        self.current_state = new_state;
        self.state_entered_at = Instant::now();

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for AccessCycle {
    fn default() -> Self {
        Self::new()
    }
}
