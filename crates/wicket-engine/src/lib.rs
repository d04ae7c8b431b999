//! Access decision orchestration.
//!
//! [`DecisionEngine`] turns one submitted PIN into exactly one
//! [`wicket_core::Decision`], fail-closed at every step, and hands it
//! to the event logger before the cycle re-arms. [`AccessPipeline`]
//! wires the keypad event stream into the engine and owns the
//! idle-expiry sweep. [`AccessCycle`] is the validated state machine
//! both are built around.

pub mod engine;
pub mod pipeline;
pub mod state;

pub use engine::DecisionEngine;
pub use pipeline::AccessPipeline;
pub use state::{AccessCycle, AccessState, CycleTransition};
