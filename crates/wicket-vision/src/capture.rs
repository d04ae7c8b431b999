//! Camera backend fallback composition.

use tracing::{debug, warn};
use wicket_hardware::{HardwareError, LiveCapture, RawImage, Result};

/// An ordered list of capture strategies tried until one succeeds.
///
/// Edge deployments often carry several camera access paths (CSI
/// ribbon, USB webcam, a still-capture tool); the chain exposes them to
/// the verifier as one [`LiveCapture`] capability instead of branching
/// logic inside it. A backend that fails one frame stays in the chain
/// and is retried on the next capture.
///
/// # Examples
///
/// ```
/// use wicket_hardware::mock::MockCamera;
/// use wicket_hardware::traits::LiveCapture;
/// use wicket_hardware::types::RawImage;
/// use wicket_vision::CaptureChain;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut broken = MockCamera::new();
/// broken.push_fault();
/// let mut working = MockCamera::new();
/// working.push_frame(RawImage::new(vec![0; 16], 4, 4));
///
/// let mut chain = CaptureChain::new(vec![broken, working]);
/// assert!(chain.capture_frame().await.is_ok());
/// # }
/// ```
#[derive(Debug)]
pub struct CaptureChain<C: LiveCapture> {
    strategies: Vec<C>,
}

impl<C: LiveCapture> CaptureChain<C> {
    /// Create a chain from backends in priority order.
    #[must_use]
    pub fn new(strategies: Vec<C>) -> Self {
        Self { strategies }
    }

    /// Number of backends in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check whether the chain has no backends.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl<C: LiveCapture> LiveCapture for CaptureChain<C> {
    async fn capture_frame(&mut self) -> Result<RawImage> {
        for (index, strategy) in self.strategies.iter_mut().enumerate() {
            match strategy.capture_frame().await {
                Ok(frame) => {
                    if index > 0 {
                        debug!(backend = index, "fallback capture backend delivered");
                    }
                    return Ok(frame);
                }
                Err(e) => {
                    warn!(backend = index, error = %e, "capture backend failed, trying next");
                }
            }
        }
        Err(HardwareError::capture_failed(
            "all capture backends exhausted",
        ))
    }
}
