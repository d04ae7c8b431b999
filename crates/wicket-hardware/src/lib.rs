//! Hardware capability abstractions for the Wicket access controller.
//!
//! This crate defines the narrow contracts between the decision pipeline
//! and its peripheral collaborators: the keypad line source, the camera,
//! the face detector/matcher backend, and the reference-image loader.
//! Mock implementations for development and testing live in [`mock`].
//!
//! Real GPIO and camera drivers implement these traits in deployment
//! builds; the core pipeline never talks to hardware directly.

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use traits::{FaceDetector, FaceMatcher, LineSource, LiveCapture, ReferenceLoader};
pub use types::{FaceRegion, RawImage, Rect, ScanSample};
