//! Face verification orchestration.
//!
//! [`FaceVerifier`] sequences reference resolution, live acquisition,
//! detection, and scoring into a single fail-closed `verify` call that
//! always produces a [`wicket_core::MatchResult`] — acquisition and
//! matcher faults become failure reasons, never crashes.
//! [`CaptureChain`] composes camera backend fallbacks into one capture
//! capability.

pub mod capture;
pub mod verifier;

pub use capture::CaptureChain;
pub use verifier::{FaceVerifier, VerifyIdentity};
