//! Mock capability implementations for testing and development.
//!
//! These devices are script-driven: tests queue up the electrical
//! samples, frames, and scores they want the pipeline to observe, then
//! run the pipeline against them without any physical hardware.

mod camera;
mod line;
mod vision;

pub use camera::MockCamera;
pub use line::MockLineSource;
pub use vision::{MockDetector, MockMatcher, MockReferenceLoader};
