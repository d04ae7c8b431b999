//! Mock camera.

use crate::error::{HardwareError, Result};
use crate::traits::LiveCapture;
use crate::types::RawImage;
use std::collections::VecDeque;

/// One scripted capture outcome.
#[derive(Debug, Clone)]
enum Capture {
    Frame(RawImage),
    Fault,
    /// Never resolves; exercises caller-side timeouts.
    Stall,
}

/// Script-driven camera.
///
/// Outcomes are consumed front to back; a drained script behaves like a
/// disconnected camera.
///
/// # Examples
///
/// ```
/// use wicket_hardware::mock::MockCamera;
/// use wicket_hardware::traits::LiveCapture;
/// use wicket_hardware::types::RawImage;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut camera = MockCamera::new();
/// camera.push_frame(RawImage::new(vec![0; 16], 4, 4));
///
/// let frame = camera.capture_frame().await.unwrap();
/// assert_eq!(frame.width, 4);
/// assert!(camera.capture_frame().await.is_err());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockCamera {
    script: VecDeque<Capture>,
}

impl MockCamera {
    /// Create a camera with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera that delivers the same frame on every capture.
    ///
    /// Convenience for tests that only care about downstream behavior.
    #[must_use]
    pub fn repeating(frame: RawImage, captures: usize) -> Self {
        let mut camera = Self::new();
        for _ in 0..captures {
            camera.push_frame(frame.clone());
        }
        camera
    }

    /// Queue a successful capture.
    pub fn push_frame(&mut self, frame: RawImage) -> &mut Self {
        self.script.push_back(Capture::Frame(frame));
        self
    }

    /// Queue a failed capture.
    pub fn push_fault(&mut self) -> &mut Self {
        self.script.push_back(Capture::Fault);
        self
    }

    /// Queue a capture that never completes.
    pub fn push_stall(&mut self) -> &mut Self {
        self.script.push_back(Capture::Stall);
        self
    }
}

impl LiveCapture for MockCamera {
    async fn capture_frame(&mut self) -> Result<RawImage> {
        match self.script.pop_front() {
            Some(Capture::Frame(frame)) => Ok(frame),
            Some(Capture::Fault) => Err(HardwareError::capture_failed("mock capture fault")),
            Some(Capture::Stall) => std::future::pending().await,
            None => Err(HardwareError::disconnected("mock camera")),
        }
    }
}
